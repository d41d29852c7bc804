use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{codecs::jpeg::JpegEncoder, ExtendedColorType, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::application::ports::FrameRendererPort;
use crate::domain::detection::{BoundingBox, Detection};

const BOX_THICKNESS: i32 = 2;
const LABEL_SCALE: f32 = 20.0;

/// Color estable por clase.
pub fn class_color(class_id: usize) -> Rgb<u8> {
    let h = (class_id as u32).wrapping_add(1).wrapping_mul(2_654_435_761);
    Rgb([(h >> 24) as u8 | 0x40, (h >> 16) as u8 | 0x40, (h >> 8) as u8 | 0x40])
}

pub fn label_text(det: &Detection) -> String {
    format!("{} {:.2}%", det.label, det.confidence)
}

/// Dibuja cajas y etiquetas y codifica el frame a JPEG.
/// Sin fuente configurada solo se dibujan las cajas.
pub struct OverlayRenderer {
    font: Option<FontVec>,
    jpeg_quality: u8,
}

impl OverlayRenderer {
    pub fn new(font_path: Option<&Path>, jpeg_quality: u8) -> Result<Self> {
        let font = match font_path {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("no se pudo leer la fuente {}", path.display()))?;
                let font = FontVec::try_from_vec(bytes)
                    .map_err(|e| anyhow::anyhow!("fuente inválida {}: {e}", path.display()))?;
                Some(font)
            }
            None => None,
        };
        Ok(Self { font, jpeg_quality })
    }

    pub fn annotate(&self, frame: &mut RgbImage, detections: &[Detection]) {
        for det in detections {
            let color = class_color(det.class_id);
            draw_box(frame, &det.bbox, color);

            if let Some(font) = &self.font {
                let text = label_text(det);
                let (tw, th) = text_size(PxScale::from(LABEL_SCALE), font, &text);
                let x = det.bbox.x1;
                let y = (det.bbox.y1 - th as i32 - 10).max(0);
                draw_filled_rect_mut(frame, Rect::at(x, y).of_size(tw.max(1) + 4, th.max(1) + 4), color);
                draw_text_mut(frame, Rgb([0, 0, 0]), x + 2, y + 2, PxScale::from(LABEL_SCALE), font, &text);
            }
        }
    }

    pub fn encode(&self, frame: &RgbImage) -> Result<Vec<u8>> {
        let mut jpeg = Vec::new();
        let mut enc = JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality);
        enc.encode(frame.as_raw(), frame.width(), frame.height(), ExtendedColorType::Rgb8)?;
        Ok(jpeg)
    }
}

fn draw_box(frame: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    for t in 0..BOX_THICKNESS {
        let w = (bbox.width() as i32 - 2 * t).max(1) as u32;
        let h = (bbox.height() as i32 - 2 * t).max(1) as u32;
        draw_hollow_rect_mut(frame, Rect::at(bbox.x1 + t, bbox.y1 + t).of_size(w, h), color);
    }
}

impl FrameRendererPort for OverlayRenderer {
    fn render(&self, frame: &mut RgbImage, detections: &[Detection]) -> Result<Vec<u8>> {
        self.annotate(frame, detections);
        self.encode(frame)
    }
}
