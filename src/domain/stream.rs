use super::detection::Detection;
use super::summary::count_labels;

pub const BOUNDARY: &str = "frame";
pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Envuelve un JPEG como una parte del stream `multipart/x-mixed-replace`.
pub fn multipart_part(jpeg: &[u8]) -> Vec<u8> {
    let head = format!("--{BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
    let mut part = Vec::with_capacity(head.len() + jpeg.len() + 2);
    part.extend_from_slice(head.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    part
}

/// Resumen legible para logs: "2 Person, 1 Cup".
pub fn summarize_detections(detections: &[Detection]) -> String {
    let labels: Vec<String> = detections.iter().map(|d| d.label.clone()).collect();
    count_labels(&labels)
        .iter()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}
