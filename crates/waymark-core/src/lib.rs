pub mod config;
pub mod generator;

pub use config::{GeneratorConfig, InputLimits};
pub use generator::{GenerateError, GenerationOutput, GenerationStats, Generator};
