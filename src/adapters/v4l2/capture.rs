use anyhow::{anyhow, Result};
use image::{ImageFormat, RgbImage};
use v4l::format::FourCC;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::application::ports::{FrameSource, FrameSourcePort};
use crate::domain::camera::{CameraId, CameraMode};
use crate::domain::errors::{DomainError, DomainResult};

/// Configuración para inicializar la captura de vídeo.
pub struct CaptureConfig {
    pub camera_path: String,
    pub fourcc: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl CaptureConfig {
    pub fn new(camera: &CameraId, mode: &CameraMode) -> Self {
        Self {
            camera_path: camera.path.clone(),
            fourcc: mode.format.clone(),
            width: mode.size.width,
            height: mode.size.height,
            fps: mode.fps,
        }
    }
}

/// Captura física de frames usando V4L2.
pub struct V4l2Capture {
    // El stream se suelta antes que el dispositivo (orden de declaración).
    stream: Stream<'static>,
    _device: Device,
    path: String,
    fourcc: FourCC,
    width: u32,
    height: u32,
}

impl V4l2Capture {
    /// Abre el dispositivo de cámara y configura el formato y el flujo de memoria mapeada (MMAP).
    pub fn open(cfg: &CaptureConfig) -> Result<Self> {
        let dev = Device::with_path(&cfg.camera_path)?;

        // 1. Configurar Formato
        let mut fmt = dev.format()?;
        fmt.fourcc = parse_fourcc(&cfg.fourcc)?;
        fmt.width = cfg.width;
        fmt.height = cfg.height;

        // El driver puede ajustar los valores a los más cercanos soportados
        let actual_fmt = dev.set_format(&fmt)?;

        // 2. Configurar FPS (Frame Interval)
        let mut params = dev.params()?;
        params.interval.numerator = 1;
        params.interval.denominator = cfg.fps;
        let _ = dev.set_params(&params);

        // 3. Inicializar Stream (MMAP)
        let stream = Stream::with_buffers(&dev, v4l::buffer::Type::VideoCapture, 4)?;

        tracing::info!(
            "Cámara abierta: {} {}x{} [{}] a {} FPS",
            cfg.camera_path, actual_fmt.width, actual_fmt.height, actual_fmt.fourcc, cfg.fps
        );

        Ok(Self {
            stream,
            _device: dev,
            path: cfg.camera_path.clone(),
            fourcc: actual_fmt.fourcc,
            width: actual_fmt.width,
            height: actual_fmt.height,
        })
    }

    /// Captura el siguiente frame y lo devuelve en RGB.
    pub fn next_rgb(&mut self) -> Result<RgbImage> {
        let (data, _) = self.stream.next()?;
        let fcc_str = self.fourcc.str().map_err(|_| anyhow!("FourCC inválido"))?;

        match fcc_str {
            // MJPG es básicamente una secuencia de JPEGs
            "MJPG" => Ok(image::load_from_memory_with_format(data, ImageFormat::Jpeg)?.to_rgb8()),
            "YUYV" => Ok(yuyv_to_rgb(data, self.width, self.height)),
            _ => Err(anyhow!("Formato de cámara {} no soportado por este pipeline", fcc_str)),
        }
    }
}

impl Drop for V4l2Capture {
    fn drop(&mut self) {
        tracing::info!("Cámara liberada: {}", self.path);
    }
}

impl FrameSource for V4l2Capture {
    fn next_frame(&mut self) -> Result<RgbImage> {
        self.next_rgb()
    }
}

/// Abre una captura V4L2 nueva por cada stream solicitado.
pub struct V4l2FrameSource;

impl V4l2FrameSource {
    pub fn new() -> Self { Self }
}

impl FrameSourcePort for V4l2FrameSource {
    fn open(&self, camera: &CameraId, mode: &CameraMode) -> DomainResult<Box<dyn FrameSource>> {
        let capture = V4l2Capture::open(&CaptureConfig::new(camera, mode))
            .map_err(|e| DomainError::Unavailable(format!("{}: {e}", camera.path)))?;
        Ok(Box::new(capture))
    }
}

pub fn parse_fourcc(raw: &str) -> Result<FourCC> {
    let b: [u8; 4] = raw
        .as_bytes()
        .try_into()
        .map_err(|_| anyhow!("FourCC debe tener 4 caracteres: {raw:?}"))?;
    Ok(FourCC::new(&b))
}

/// Convierte un buffer YUYV (YUV 4:2:2) a una RgbImage.
fn yuyv_to_rgb(yuyv: &[u8], w: u32, h: u32) -> RgbImage {
    let mut out = RgbImage::new(w, h);

    // Cada bloque de 4 bytes en YUYV define 2 píxeles: [Y0, U, Y1, V]
    for (i, chunk) in yuyv.chunks_exact(4).enumerate() {
        let y0 = chunk[0] as f32;
        let u  = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v  = chunk[3] as f32 - 128.0;

        // BT.601
        let to_rgb = |y: f32| {
            image::Rgb([
                (y + 1.402 * v).clamp(0.0, 255.0) as u8,
                (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8,
                (y + 1.772 * u).clamp(0.0, 255.0) as u8,
            ])
        };

        let pixel_idx = i as u32 * 2;
        let x = pixel_idx % w;
        let y = pixel_idx / w;

        if y < h {
            out.put_pixel(x, y, to_rgb(y0));
            if x + 1 < w {
                out.put_pixel(x + 1, y, to_rgb(y1));
            }
        }
    }
    out
}
