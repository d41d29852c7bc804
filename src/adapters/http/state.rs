use std::sync::Arc;

use crate::application::services::{FeedService, StreamService};
use crate::config::AppConfig;

/// Estado compartido para los manejadores HTTP de Axum.
/// Siguiendo la Arquitectura Hexagonal, el estado contiene los servicios (Casos de Uso).
#[derive(Clone)]
pub struct HttpState {
    /// Estado del feed: pausa, historial y registro de resúmenes.
    pub feed: Arc<FeedService>,
    /// Servicio que abre un stream MJPEG por cliente.
    pub stream: Arc<StreamService>,
    /// Configuración efectiva, expuesta en `/api/config`.
    pub config: Arc<AppConfig>,
}
