use serde::{Deserialize, Serialize};

/// Caja en coordenadas de píxel; siempre `x1 <= x2` e `y1 <= y2`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Construye la caja normalizando el orden de las esquinas.
    pub fn new(xa: i32, ya: i32, xb: i32, yb: i32) -> Self {
        Self {
            x1: xa.min(xb),
            y1: ya.min(yb),
            x2: xa.max(xb),
            y2: ya.max(yb),
        }
    }

    pub fn width(&self) -> u32 {
        (self.x2 - self.x1) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y2 - self.y1) as u32
    }

    fn area(&self) -> f32 {
        self.width() as f32 * self.height() as f32
    }

    /// Intersección sobre unión, usada por la supresión de no-máximos.
    pub fn iou(&self, other: &Self) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0) as f32;
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0) as f32;
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub class_id: usize,
    /// Confianza en porcentaje (0..100).
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Etiquetas detectadas en un único frame, en orden de detección.
pub type FrameLabels = Vec<String>;

pub fn labels_of(detections: &[Detection]) -> FrameLabels {
    detections.iter().map(|d| d.label.clone()).collect()
}
