//! Drawing the overlay: a small surface abstraction and an in-memory
//! implementation backed by the `image` crate.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{imageops::FilterType, DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use thiserror::Error;

use crate::{
    maps::MapDefinition,
    overlay::{OverlayPlan, PixelRect},
};

pub const OVERLAY_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load map image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to encode overlay image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Two-operation drawing target, modelled on a 2D canvas context.
pub trait Surface {
    /// Resizes and clears the surface.
    fn reset(&mut self, width: u32, height: u32);
    /// Draws `image` stretched to cover the whole surface.
    fn draw_image(&mut self, image: &RgbaImage);
    /// Strokes the outline of `rect`; the line is centred on the outline.
    fn stroke_rect(&mut self, rect: &PixelRect, line_width: f64, color: Rgba<u8>);
}

/// Redraws the whole frame: scaled map image, then the overlay outline.
pub fn render_overlay<S: Surface + ?Sized>(surface: &mut S, image: &RgbaImage, plan: &OverlayPlan) {
    let (width, height) = plan.canvas.surface_dimensions();
    surface.reset(width, height);
    surface.draw_image(image);
    surface.stroke_rect(&plan.rect, plan.line_width as f64, OVERLAY_COLOR);
}

#[derive(Debug, Clone, Default)]
pub struct ImageSurface {
    buffer: RgbaImage,
}

impl ImageSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(self.buffer.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(bytes)
    }
}

impl Surface for ImageSurface {
    fn reset(&mut self, width: u32, height: u32) {
        self.buffer = RgbaImage::new(width, height);
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        let (width, height) = self.buffer.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        self.buffer = if image.dimensions() == (width, height) {
            image.clone()
        } else {
            image::imageops::resize(image, width, height, FilterType::Triangle)
        };
    }

    fn stroke_rect(&mut self, rect: &PixelRect, line_width: f64, color: Rgba<u8>) {
        if ![rect.x, rect.y, rect.width, rect.height, line_width]
            .iter()
            .all(|value| value.is_finite())
        {
            tracing::debug!(?rect, line_width, "skipping stroke for non-finite rectangle");
            return;
        }
        let half = line_width / 2.0;
        let (left, right) = ordered(rect.x, rect.x + rect.width);
        let (top, bottom) = ordered(rect.y, rect.y + rect.height);
        let outer = (left - half, top - half, right + half, bottom + half);
        let inner = (left + half, top + half, right - half, bottom - half);

        let (width, height) = self.buffer.dimensions();
        let first_col = outer.0.floor().max(0.0) as u32;
        let first_row = outer.1.floor().max(0.0) as u32;
        let last_col = (outer.2.ceil().max(0.0) as u32).min(width);
        let last_row = (outer.3.ceil().max(0.0) as u32).min(height);

        for py in first_row..last_row {
            for px in first_col..last_col {
                let cx = px as f64 + 0.5;
                let cy = py as f64 + 0.5;
                let in_outer = cx >= outer.0 && cx < outer.2 && cy >= outer.1 && cy < outer.3;
                let in_inner = cx >= inner.0 && cx < inner.2 && cy >= inner.1 && cy < inner.3;
                if in_outer && !in_inner {
                    self.buffer.put_pixel(px, py, color);
                }
            }
        }
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

pub fn map_image_path(assets_dir: &Path, map: &MapDefinition) -> PathBuf {
    assets_dir.join(map.image_source.as_ref())
}

pub fn load_map_image(assets_dir: &Path, map: &MapDefinition) -> Result<RgbaImage, RenderError> {
    let path = map_image_path(assets_dir, map);
    image::open(&path)
        .map(|image| image.to_rgba8())
        .map_err(|source| RenderError::Load { path, source })
}

/// Pixel size of the map image without decoding the whole file.
pub fn map_image_dimensions(assets_dir: &Path, map: &MapDefinition) -> Result<(u32, u32), RenderError> {
    let path = map_image_path(assets_dir, map);
    image::image_dimensions(&path).map_err(|source| RenderError::Load { path, source })
}

/// Renders a plan over an already-decoded map image and encodes it as PNG.
pub fn render_png(image: &RgbaImage, plan: &OverlayPlan) -> Result<Vec<u8>, RenderError> {
    let mut surface = ImageSurface::new();
    render_overlay(&mut surface, image, plan);
    surface.to_png()
}
