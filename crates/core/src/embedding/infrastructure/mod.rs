pub mod onnx_embedding_provider;
