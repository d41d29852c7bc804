pub mod clock;
pub mod http;
pub mod onnx;
pub mod overlay;
pub mod v4l2;
