use ndarray::ShapeError;
use thiserror::Error;

/// Unified captioning errors.
#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ndarray shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Graph config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model input not found: {0}")]
    InputNotFound(String),

    #[error("Model output not found: {0}")]
    OutputNotFound(String),

    #[error("Model files not found under {0}")]
    ModelNotFound(String),

    #[error("Invalid decoder configuration: {0}")]
    InvalidConfig(String),

    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    #[error("Engine returned {actual} result(s) for a batch of {expected}")]
    BatchMismatch { expected: usize, actual: usize },

    #[error("Engine returned an empty token distribution")]
    EmptyDistribution,

    #[error("Engine error: {0}")]
    Engine(String),
}

impl CaptionError {
    /// Errors raised before decoding starts, caused by the caller's inputs.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_) | Self::Vocabulary(_) | Self::EmptyDistribution
        )
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => {
                "The beam search settings are invalid. Check beam size, caption length and normalization."
            }
            Self::Vocabulary(_) => {
                "The vocabulary file is missing, malformed or lacks the start and end tokens."
            }
            Self::Json(_) => "The model's im2txt.json file could not be parsed.",
            Self::ModelNotFound(_) => {
                "The captioning model files are missing. Check the model directory."
            }
            Self::Ort(_)
            | Self::InputNotFound(_)
            | Self::OutputNotFound(_)
            | Self::Shape(_)
            | Self::BatchMismatch { .. }
            | Self::EmptyDistribution
            | Self::Engine(_) => {
                "The captioning model failed to run. Check that the model files match the configuration."
            }
            Self::Io(_) => {
                "Could not read the model or input files. Check the paths and permissions."
            }
        }
    }
}
