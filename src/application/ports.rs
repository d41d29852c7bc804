use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{
    camera::{CameraId, CameraMode},
    detection::Detection,
    errors::DomainResult,
    model::ModelId,
};

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}

/// Secuencia infinita de frames RGB de un dispositivo abierto.
/// Al soltarla se libera el dispositivo.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> anyhow::Result<RgbImage>;
}

pub trait FrameSourcePort: Send + Sync {
    fn open(&self, camera: &CameraId, mode: &CameraMode) -> DomainResult<Box<dyn FrameSource>>;
}

/// Inferencia opaca: frame -> detecciones.
pub trait DetectorPort: Send {
    fn detect(&mut self, frame: &RgbImage) -> anyhow::Result<Vec<Detection>>;
}

/// Dibuja las detecciones sobre el frame y lo codifica para el stream.
pub trait FrameRendererPort: Send + Sync {
    fn render(&self, frame: &mut RgbImage, detections: &[Detection]) -> anyhow::Result<Vec<u8>>;
}

pub trait ClockPort: Send + Sync {
    /// Segundo de reloj actual, "HH:MM:SS".
    fn now_hms(&self) -> String;
}
