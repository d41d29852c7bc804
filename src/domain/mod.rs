pub mod camera;
pub mod detection;
pub mod errors;
pub mod feed;
pub mod model;
pub mod stream;
pub mod summary;
pub mod window;
