pub mod caption;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod onnx;
pub mod vocabulary;

pub use caption::{Caption, CaptionGenerator};
pub use config::{BeamConfig, GraphConfig};
pub use engine::{InferenceEngine, StepOutput};
pub use error::CaptionError;
pub use vocabulary::{TokenId, Vocabulary};
