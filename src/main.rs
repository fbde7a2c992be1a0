use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use westward_companion::{
    canvas::{self, ImageSurface},
    config::AppConfig,
    emulator::PetSlot,
    input::{parse_float, parse_int},
    overlay::{Coordinate, OverlayPlan, OverlayView},
    pet::{PetAttributes, PetField},
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Map overlay and pet stat companion")]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the selectable maps
    Maps,

    /// Compute the search overlay for a position, optionally rendering it
    Overlay {
        /// Map name (defaults to the first map in the catalog)
        #[arg(long)]
        map: Option<String>,

        /// Horizontal coordinate, as typed
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        x: String,

        /// Vertical coordinate, as typed
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        y: String,

        /// Map image to use instead of the one in the asset directory
        #[arg(long)]
        image: Option<PathBuf>,

        /// Image width in pixels, when no image is read
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Image height in pixels, when no image is read
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Write the rendered overlay PNG here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compute derived pet stats
    Pet {
        /// YAML file with pet attributes; missing fields are zero
        #[arg(long)]
        attrs: Option<PathBuf>,

        /// Attribute override, e.g. `--set growth_rate=1.25`
        #[arg(long = "set", value_name = "FIELD=VALUE", allow_hyphen_values = true)]
        overrides: Vec<String>,
    },

    /// Run the HTTP service
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_yaml(path)?,
        None => AppConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Maps => list_maps(&config),
        Command::Overlay {
            map,
            x,
            y,
            image,
            width,
            height,
            output,
        } => {
            let coordinate = Coordinate::new(parse_int(&x), parse_int(&y));
            overlay(&config, map, coordinate, image, width.zip(height), output)
        }
        Command::Pet { attrs, overrides } => pet(attrs, &overrides),
        Command::Serve { host, port } => {
            let catalog = config.map_catalog().context("failed to load map catalog")?;
            web::run(WebServerConfig {
                catalog,
                assets_dir: config.assets.dir.clone(),
                host: host.unwrap_or_else(|| config.server.host.clone()),
                port: port.unwrap_or(config.server.port),
            })
            .await
        }
    }
}

fn list_maps(config: &AppConfig) -> Result<()> {
    let catalog = config.map_catalog().context("failed to load map catalog")?;
    for map in catalog.iter() {
        println!(
            "{}\t{}x{}\tscale {}\tline {}\t{}",
            map.name,
            map.x_max,
            map.y_max,
            map.scale,
            map.line_width(),
            map.image_source
        );
    }
    Ok(())
}

fn overlay(
    config: &AppConfig,
    map_name: Option<String>,
    coordinate: Coordinate,
    image_path: Option<PathBuf>,
    size: Option<(u32, u32)>,
    output: Option<PathBuf>,
) -> Result<()> {
    let catalog = config.map_catalog().context("failed to load map catalog")?;
    let map = match &map_name {
        Some(name) => catalog.get(name)?,
        None => catalog.default_map(),
    };

    let map_image = if image_path.is_some() || output.is_some() || size.is_none() {
        let decoded = match &image_path {
            Some(path) => image::open(path)
                .with_context(|| format!("failed to read image {}", path.display()))?
                .to_rgba8(),
            None => canvas::load_map_image(&config.assets.dir, map)?,
        };
        Some(decoded)
    } else {
        None
    };

    let (plan, view) = match (map_image, size) {
        (Some(decoded), _) => {
            let mut view = OverlayView::new(map.clone(), ImageSurface::new());
            view.set_x(coordinate.x);
            view.set_y(coordinate.y);
            view.image_loaded(decoded);
            let plan = view.plan().cloned().context("overlay was not drawn")?;
            (plan, Some(view))
        }
        (None, Some((width, height))) => (OverlayPlan::compute(map, coordinate, width, height), None),
        (None, None) => bail!("image dimensions unknown; pass --image or --width/--height"),
    };
    println!("{}", serde_json::to_string_pretty(&plan)?);

    if let (Some(output), Some(view)) = (output, view) {
        let png = view.surface().to_png()?;
        fs::write(&output, png)
            .with_context(|| format!("failed to write {}", output.display()))?;
        tracing::info!(path = %output.display(), "overlay written");
    }
    Ok(())
}

fn pet(attrs_path: Option<PathBuf>, overrides: &[String]) -> Result<()> {
    let mut attributes = match attrs_path {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_yaml::from_str::<PetAttributes>(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => PetAttributes::default(),
    };

    for entry in overrides {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("expected FIELD=VALUE, got '{entry}'");
        };
        let field: PetField = key.trim().parse()?;
        attributes.set(field, parse_float(value));
    }

    let slot = PetSlot::new(attributes);
    println!("{}", serde_json::to_string_pretty(&slot)?);
    Ok(())
}
