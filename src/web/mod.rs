use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    canvas::{self, RenderError},
    emulator::{Emulator, EmulatorSnapshot, Side, SideParseError},
    input::parse_int,
    maps::{MapCatalog, MapDefinition, MapError},
    overlay::{Coordinate, OverlayPlan},
    pet::{compute_stats, FieldParseError, PetAttributes, PetField, PetResult},
};

pub struct AppState {
    catalog: MapCatalog,
    assets_dir: PathBuf,
    emulator: Mutex<Emulator>,
    broadcaster: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(catalog: MapCatalog, assets_dir: PathBuf) -> Self {
        let (broadcaster, _) = broadcast::channel::<String>(64);
        Self {
            catalog,
            assets_dir,
            emulator: Mutex::new(Emulator::new()),
            broadcaster,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcaster.subscribe()
    }

    fn emulator(&self) -> MutexGuard<'_, Emulator> {
        // Edits never leave the emulator half-written, so a poisoned lock is still usable.
        self.emulator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: &EmulatorSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(payload) => {
                // No subscribers is not an error.
                let _ = self.broadcaster.send(payload);
            }
            Err(err) => tracing::debug!(error = %err, "emulator snapshot not published"),
        }
    }
}

pub struct WebServerConfig {
    pub catalog: MapCatalog,
    pub assets_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        catalog,
        assets_dir,
        host,
        port,
    } = config;

    tracing::info!(
        maps = catalog.len(),
        assets = %assets_dir.display(),
        "starting companion service"
    );
    let state = Arc::new(AppState::new(catalog, assets_dir));

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("companion service listening on http://{addr} (Ctrl+C to stop)");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/maps", get(list_maps))
        .route("/api/maps/:name/image", get(map_image))
        .route("/api/overlay", get(overlay_plan))
        .route("/api/overlay/render", get(overlay_render))
        .route("/api/pet/stats", post(pet_stats))
        .route("/api/emulator", get(emulator_state))
        .route("/api/emulator/copy", post(emulator_copy))
        .route("/api/emulator/:side/:field", post(emulator_edit))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down companion service");
}

#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Field(#[from] FieldParseError),
    #[error(transparent)]
    Side(#[from] SideParseError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Map(MapError::Unknown(_)) => StatusCode::NOT_FOUND,
            ApiError::Render(RenderError::Load {
                source: image::ImageError::IoError(err),
                ..
            }) if err.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ApiError::Field(_) | ApiError::Side(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

async fn list_maps(State(state): State<Arc<AppState>>) -> Json<Vec<MapDefinition>> {
    Json(state.catalog.iter().cloned().collect())
}

async fn map_image(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let map = state.catalog.get(&name)?.clone();
    let path = canvas::map_image_path(&state.assets_dir, &map);
    let data = tokio::task::spawn_blocking(move || std::fs::read(&path).map_err(|err| (path, err)))
        .await?
        .map_err(|(path, err)| RenderError::Load {
            path,
            source: image::ImageError::IoError(err),
        })?;
    Ok(png_response(data))
}

fn png_response(data: Vec<u8>) -> Response {
    (
        [(header::CONTENT_TYPE, "image/png")],
        Body::from(Bytes::from(data)),
    )
        .into_response()
}

/// Coordinates arrive as raw field text and go through integer parsing;
/// an absent field counts as 0.
#[derive(Debug, Deserialize)]
struct OverlayQuery {
    map: Option<String>,
    x: Option<String>,
    y: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl OverlayQuery {
    fn coordinate(&self) -> Coordinate {
        let field = |text: &Option<String>| text.as_deref().map(parse_int).unwrap_or(0.0);
        Coordinate::new(field(&self.x), field(&self.y))
    }

    fn map<'a>(&self, catalog: &'a MapCatalog) -> Result<&'a MapDefinition, MapError> {
        match &self.map {
            Some(name) => catalog.get(name),
            None => Ok(catalog.default_map()),
        }
    }
}

async fn overlay_plan(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OverlayQuery>,
) -> Result<Json<OverlayPlan>, ApiError> {
    let map = query.map(&state.catalog)?.clone();
    let coordinate = query.coordinate();
    let (width, height) = match (query.width, query.height) {
        (Some(width), Some(height)) => (width, height),
        _ => {
            let assets_dir = state.assets_dir.clone();
            let map = map.clone();
            tokio::task::spawn_blocking(move || canvas::map_image_dimensions(&assets_dir, &map))
                .await??
        }
    };
    Ok(Json(OverlayPlan::compute(&map, coordinate, width, height)))
}

async fn overlay_render(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OverlayQuery>,
) -> Result<Response, ApiError> {
    let map = query.map(&state.catalog)?.clone();
    let coordinate = query.coordinate();
    let assets_dir = state.assets_dir.clone();
    let data = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, RenderError> {
        let image = canvas::load_map_image(&assets_dir, &map)?;
        let plan = OverlayPlan::compute(&map, coordinate, image.width(), image.height());
        canvas::render_png(&image, &plan)
    })
    .await??;
    Ok(png_response(data))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PetStatsResponse {
    pub result: PetResult,
    pub unallocated_points: f64,
}

async fn pet_stats(Json(attributes): Json<PetAttributes>) -> Json<PetStatsResponse> {
    Json(PetStatsResponse {
        result: compute_stats(&attributes),
        unallocated_points: attributes.unallocated_points(),
    })
}

async fn emulator_state(State(state): State<Arc<AppState>>) -> Json<EmulatorSnapshot> {
    Json(state.emulator().snapshot())
}

async fn emulator_copy(State(state): State<Arc<AppState>>) -> Json<EmulatorSnapshot> {
    let snapshot = {
        let mut emulator = state.emulator();
        emulator.copy_to_compared();
        emulator.snapshot()
    };
    state.publish(&snapshot);
    Json(snapshot)
}

/// The body is the raw field text, parsed the same permissive way a form
/// input would be.
async fn emulator_edit(
    State(state): State<Arc<AppState>>,
    Path((side, field)): Path<(String, String)>,
    body: String,
) -> Result<Json<EmulatorSnapshot>, ApiError> {
    let side: Side = side.parse()?;
    let field: PetField = field.parse()?;
    let snapshot = {
        let mut emulator = state.emulator();
        emulator.edit_text(side, field, &body);
        emulator.snapshot()
    };
    state.publish(&snapshot);
    Ok(Json(snapshot))
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
