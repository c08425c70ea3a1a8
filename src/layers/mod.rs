pub mod dropout;
pub mod embedding;

pub use dropout::Dropout;
pub use embedding::EmbeddingT;
