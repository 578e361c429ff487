pub mod embedding;
pub mod embedding_provider;
