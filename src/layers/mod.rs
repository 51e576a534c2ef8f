pub mod dense;
pub mod dropout;

pub use dense::{Dense, LayerGradients};
pub use dropout::Dropout;
