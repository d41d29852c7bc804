//! Puertos de prueba deterministas: cámara guionizada, detector fijo y reloj manual.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use image::{Rgb, RgbImage};

use crate::application::ports::{ClockPort, DetectorPort, FrameRendererPort, FrameSource, FrameSourcePort};
use crate::domain::{
    camera::{CameraId, CameraMode},
    detection::{BoundingBox, Detection},
    errors::{DomainError, DomainResult},
};

pub struct ManualClock(Mutex<String>);

impl ManualClock {
    pub fn new(now: &str) -> Self {
        Self(Mutex::new(now.to_string()))
    }

    pub fn set(&self, now: &str) {
        *self.0.lock().unwrap() = now.to_string();
    }
}

impl ClockPort for ManualClock {
    fn now_hms(&self) -> String {
        self.0.lock().unwrap().clone()
    }
}

/// Cámara falsa: frames sólidos, o errores de lectura si `fail` está activo.
#[derive(Clone)]
pub struct ScriptedFrames {
    width: u32,
    height: u32,
    fail: bool,
    pub reads: Arc<AtomicUsize>,
    pub released: Arc<AtomicBool>,
}

impl ScriptedFrames {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail: false,
            reads: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::new(8, 8) }
    }
}

struct ScriptedSource {
    frames: ScriptedFrames,
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> anyhow::Result<RgbImage> {
        self.frames.reads.fetch_add(1, Ordering::SeqCst);
        if self.frames.fail {
            return Err(anyhow!("dispositivo ilegible"));
        }
        Ok(RgbImage::from_pixel(self.frames.width, self.frames.height, Rgb([40, 40, 40])))
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.frames.released.store(true, Ordering::SeqCst);
    }
}

impl FrameSourcePort for ScriptedFrames {
    fn open(&self, _camera: &CameraId, _mode: &CameraMode) -> DomainResult<Box<dyn FrameSource>> {
        Ok(Box::new(ScriptedSource { frames: self.clone() }))
    }
}

pub struct UnavailableFrames;

impl FrameSourcePort for UnavailableFrames {
    fn open(&self, camera: &CameraId, _mode: &CameraMode) -> DomainResult<Box<dyn FrameSource>> {
        Err(DomainError::Unavailable(format!("{} ocupado", camera.path)))
    }
}

/// Devuelve siempre las mismas detecciones.
pub struct FixedDetector(Vec<Detection>);

impl FixedDetector {
    pub fn labels(labels: &[&str]) -> Self {
        Self(
            labels
                .iter()
                .enumerate()
                .map(|(i, label)| Detection {
                    label: label.to_string(),
                    class_id: i,
                    confidence: 87.5,
                    bbox: BoundingBox::new(1, 1, 4, 4),
                })
                .collect(),
        )
    }
}

impl DetectorPort for FixedDetector {
    fn detect(&mut self, _frame: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        Ok(self.0.clone())
    }
}

pub struct FailingDetector;

impl DetectorPort for FailingDetector {
    fn detect(&mut self, _frame: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        Err(anyhow!("sesión ONNX rota"))
    }
}

/// Renderizador sin anotación: bytes JPEG ficticios.
pub struct PlainRenderer;

impl FrameRendererPort for PlainRenderer {
    fn render(&self, _frame: &mut RgbImage, _detections: &[Detection]) -> anyhow::Result<Vec<u8>> {
        Ok(vec![0xFF, 0xD8, 0xFF, 0xD9])
    }
}

/// Espera hasta 2 s a que `cond` se cumpla.
pub async fn wait_until(cond: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
