mod domain;
mod application;
mod adapters;
mod config;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use clap::Parser;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::application::ports::ModelCatalogPort;
use crate::application::services::{FeedService, StreamService};
use crate::adapters::{
    clock::SystemClock,
    http::{router, state::HttpState},
    onnx::{model_catalog::OnnxModelCatalog, yolo_engine::OnnxYoloEngine},
    overlay::renderer::OverlayRenderer,
    v4l2::capture::V4l2FrameSource,
};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = AppConfig::parse();
    config.validate()?;

    tracing::info!("🔧 Inicializando adaptadores de infraestructura...");

    // 2. Modelo: se valida y se carga una sola vez para todos los streams
    let model = config.model_id();
    OnnxModelCatalog::new().validate_model(&model).await?;
    let params = config.yolo_params();
    let onnx_path = model.onnx_path.clone();
    let engine = tokio::task::spawn_blocking(move || OnnxYoloEngine::load(&onnx_path, params)).await??;

    // 3. Adaptadores restantes
    let frames = Arc::new(V4l2FrameSource::new());
    let renderer = Arc::new(OverlayRenderer::new(config.font.as_deref(), config.jpeg_quality)?);
    if config.font.is_none() {
        tracing::warn!("Sin --font: las etiquetas no se dibujarán, solo las cajas");
    }

    // 4. Servicios (Capa de Aplicación - Casos de Uso)
    let feed = FeedService::new(Arc::new(SystemClock));
    let stream = StreamService::new(frames, Box::new(engine), renderer, feed.clone(), config.stream_settings());

    let addr = config.bind.clone();
    let static_dir = config.static_dir.clone();
    let state = HttpState {
        feed: Arc::new(feed),
        stream: Arc::new(stream),
        config: Arc::new(config),
    };

    // 5. Router de Axum y archivos estáticos (la página principal vive en ./static)
    let app = router(state)
        .fallback_service(ServeDir::new(&static_dir))
        .layer(TraceLayer::new_for_http());

    // 6. Lanzar el Servidor
    tracing::info!("🚀 Servidor iniciado en http://{}", addr);
    tracing::info!("📂 Archivos estáticos servidos desde {}", static_dir.display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
