pub mod comparison;
pub mod detection;
pub mod embedding;
pub mod imaging;
pub mod pipeline;
pub mod shared;
