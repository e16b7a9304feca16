use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CaptionError;

pub const GRAPH_CONFIG_FILE: &str = "im2txt.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamConfig {
    pub beam_size: usize,
    pub max_caption_length: usize,
    pub length_normalization_factor: f32,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            beam_size: 3,
            max_caption_length: 20,
            length_normalization_factor: 0.0,
        }
    }
}

impl BeamConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides("IM2TXT_");
        config
    }

    pub fn apply_env_overrides(&mut self, prefix: &str) {
        let read_env = |suffix: &str| std::env::var(format!("{prefix}{suffix}")).ok();

        let parse_usize = |suffix: &str, target: &mut usize| {
            if let Some(raw) = read_env(suffix) {
                match raw.trim().parse() {
                    Ok(v) => *target = v,
                    Err(err) => log::warn!("Ignoring invalid {prefix}{suffix}={raw:?}: {err}"),
                }
            }
        };
        parse_usize("BEAM_SIZE", &mut self.beam_size);
        parse_usize("MAX_CAPTION_LENGTH", &mut self.max_caption_length);

        if let Some(raw) = read_env("LENGTH_NORMALIZATION") {
            match raw.trim().parse() {
                Ok(v) => self.length_normalization_factor = v,
                Err(err) => {
                    log::warn!("Ignoring invalid {prefix}LENGTH_NORMALIZATION={raw:?}: {err}")
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), CaptionError> {
        if self.beam_size == 0 {
            return Err(CaptionError::InvalidConfig(
                "beam_size must be positive".into(),
            ));
        }
        if self.max_caption_length == 0 {
            return Err(CaptionError::InvalidConfig(
                "max_caption_length must be positive".into(),
            ));
        }
        let factor = self.length_normalization_factor;
        if !factor.is_finite() || factor < 0.0 {
            return Err(CaptionError::InvalidConfig(format!(
                "length_normalization_factor must be a non-negative number, got {factor}"
            )));
        }
        Ok(())
    }
}

/// File and node names of the exported show-and-tell graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub encoder_model: String,
    pub decoder_model: String,
    pub vocabulary_file: String,
    pub image_feed: String,
    pub initial_state: String,
    pub input_feed: String,
    pub state_feed: String,
    pub softmax: String,
    pub state: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            encoder_model: "image_encoder.onnx".into(),
            decoder_model: "lstm_step.onnx".into(),
            vocabulary_file: "word_counts.txt".into(),
            image_feed: "image_feed".into(),
            initial_state: "lstm/initial_state".into(),
            input_feed: "input_feed".into(),
            state_feed: "lstm/state_feed".into(),
            softmax: "softmax".into(),
            state: "lstm/state".into(),
        }
    }
}

impl GraphConfig {
    /// Reads `im2txt.json` from the model directory, or the defaults when absent.
    pub fn load<P: AsRef<Path>>(model_dir: P) -> Result<Self, CaptionError> {
        let path = model_dir.as_ref().join(GRAPH_CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {} in model dir, using default graph names", GRAPH_CONFIG_FILE);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        let config = serde_json::from_str(&content)?;
        log::info!("Loaded graph config from {}", path.display());
        Ok(config)
    }
}
