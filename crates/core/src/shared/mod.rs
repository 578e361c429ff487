pub mod bounding_box;
pub mod constants;
pub mod face_image;
pub mod model_resolver;
pub mod onnx_session;
