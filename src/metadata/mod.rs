pub mod extraction;
pub mod extractor;
pub mod intensity;
pub mod matching;
pub mod titles;
pub mod types;

pub use types::*;

pub use crate::TARGET_METADATA;
