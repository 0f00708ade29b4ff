pub mod builtin;
pub mod engine;
pub mod types;

pub use engine::PatternAnalyzer;
pub use types::*;
