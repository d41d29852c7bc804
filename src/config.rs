use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;

use crate::application::services::StreamSettings;
use crate::domain::{
    camera::{CameraId, CameraMode, FrameSize},
    errors::{DomainError, DomainResult},
    model::{ModelId, YoloParams},
};

/// Configuración del servidor. Cada opción admite su variable `RECOGNIZER_*`.
#[derive(Debug, Clone, Parser, Serialize)]
#[command(name = "feed-recognizer", version, about = "Feed de cámara con detección YOLO")]
pub struct AppConfig {
    /// Dirección de escucha HTTP
    #[arg(long, env = "RECOGNIZER_BIND", default_value = "0.0.0.0:8090")]
    pub bind: String,

    /// Dispositivo V4L2
    #[arg(long, env = "RECOGNIZER_CAMERA", default_value = "/dev/video0")]
    pub camera: String,

    #[arg(long, env = "RECOGNIZER_FOURCC", default_value = "MJPG")]
    pub fourcc: String,

    #[arg(long, env = "RECOGNIZER_WIDTH", default_value_t = 640)]
    pub width: u32,

    #[arg(long, env = "RECOGNIZER_HEIGHT", default_value_t = 480)]
    pub height: u32,

    /// FPS pedidos a la cámara
    #[arg(long, env = "RECOGNIZER_CAPTURE_FPS", default_value_t = 30)]
    pub capture_fps: u32,

    /// FPS objetivo del stream MJPEG
    #[arg(long, env = "RECOGNIZER_FPS", default_value_t = 30)]
    pub fps: u32,

    /// Espejo horizontal de cada frame
    #[arg(long, env = "RECOGNIZER_MIRROR", default_value_t = true, action = clap::ArgAction::Set)]
    pub mirror: bool,

    #[arg(long, env = "RECOGNIZER_JPEG_QUALITY", default_value_t = 80)]
    pub jpeg_quality: u8,

    #[arg(long, env = "RECOGNIZER_MODEL", default_value = "models/yolo11n.onnx")]
    pub model_path: String,

    #[arg(long, env = "RECOGNIZER_IMGSZ", default_value_t = 640)]
    pub imgsz: u32,

    #[arg(long, env = "RECOGNIZER_CONF", default_value_t = 0.25)]
    pub conf_thres: f32,

    #[arg(long, env = "RECOGNIZER_IOU", default_value_t = 0.45)]
    pub iou_thres: f32,

    #[arg(long, env = "RECOGNIZER_MAX_DET", default_value_t = 100)]
    pub max_det: usize,

    #[arg(long, env = "RECOGNIZER_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Fuente TTF/OTF para el texto de las etiquetas (sin ella solo se dibujan cajas)
    #[arg(long, env = "RECOGNIZER_FONT")]
    pub font: Option<PathBuf>,

    /// Intervalo de sondeo de la pausa, en milisegundos
    #[arg(long, env = "RECOGNIZER_PAUSE_POLL_MS", default_value_t = 100)]
    pub pause_poll_ms: u64,
}

impl AppConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.fourcc.len() != 4 {
            return Err(DomainError::InvalidInput(format!("fourcc debe tener 4 caracteres: {}", self.fourcc)));
        }
        if self.fps == 0 || self.capture_fps == 0 {
            return Err(DomainError::InvalidInput("fps debe ser mayor que 0".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(DomainError::InvalidInput(format!("jpeg_quality fuera de 1..100: {}", self.jpeg_quality)));
        }
        for (name, v) in [("conf_thres", self.conf_thres), ("iou_thres", self.iou_thres)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(DomainError::InvalidInput(format!("{name} fuera de 0..1: {v}")));
            }
        }
        if self.imgsz == 0 || self.max_det == 0 {
            return Err(DomainError::InvalidInput("imgsz y max_det deben ser mayores que 0".into()));
        }
        Ok(())
    }

    pub fn camera_id(&self) -> CameraId {
        CameraId { path: self.camera.clone() }
    }

    pub fn camera_mode(&self) -> CameraMode {
        CameraMode {
            format: self.fourcc.clone(),
            size: FrameSize { width: self.width, height: self.height },
            fps: self.capture_fps,
        }
    }

    pub fn model_id(&self) -> ModelId {
        let name = std::path::Path::new(&self.model_path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "yolo".into());
        ModelId { name, onnx_path: self.model_path.clone() }
    }

    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.imgsz,
            conf_threshold: self.conf_thres,
            iou_threshold: self.iou_thres,
            max_detections: self.max_det,
        }
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            camera: self.camera_id(),
            mode: self.camera_mode(),
            fps: self.fps,
            mirror: self.mirror,
            pause_poll: Duration::from_millis(self.pause_poll_ms),
        }
    }
}
