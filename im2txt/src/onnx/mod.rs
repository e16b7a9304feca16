mod model;
mod paths;

pub use model::{DecoderState, OrtEngine};
pub use paths::{default_model_root, fallback_model_root, missing_model_files, resolve_model_dir};
