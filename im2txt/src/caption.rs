//! High-level captioning facade.

use std::path::Path;
use std::time::Instant;

use ndarray::ArrayViewD;
use serde::Serialize;

use crate::config::{BeamConfig, GraphConfig};
use crate::decoder::{beam_search, Hypothesis};
use crate::engine::InferenceEngine;
use crate::error::CaptionError;
use crate::onnx::{resolve_model_dir, OrtEngine};
use crate::vocabulary::{TokenId, Vocabulary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Caption {
    pub text: String,
    pub words: Vec<String>,
    pub token_ids: Vec<TokenId>,
    pub log_probability: f32,
    pub score: f32,
}

impl Caption {
    pub fn from_hypothesis<S>(hypothesis: Hypothesis<S>, vocab: &Vocabulary) -> Self {
        let (token_ids, _state, log_probability, score) = hypothesis.into_parts();
        Self {
            text: vocab.render(&token_ids),
            words: vocab.caption_words(&token_ids),
            token_ids,
            log_probability,
            score,
        }
    }

    pub fn probability(&self) -> f32 {
        self.log_probability.exp()
    }
}

pub struct CaptionGenerator<E> {
    engine: E,
    vocab: Vocabulary,
    config: BeamConfig,
}

impl CaptionGenerator<OrtEngine> {
    /// Loads `im2txt.json` (if any), both ONNX graphs and the vocabulary from `model_dir`.
    pub fn from_model_dir<P: AsRef<Path>>(
        model_dir: P,
        config: BeamConfig,
    ) -> Result<Self, CaptionError> {
        let start = Instant::now();
        let graph = GraphConfig::load(&model_dir)?;
        let model_dir = resolve_model_dir(&model_dir, &graph)?;
        let vocab = Vocabulary::from_file(model_dir.join(&graph.vocabulary_file))?;
        let engine = OrtEngine::new(&model_dir, graph)?;
        log::info!(
            "Caption generator loaded from {} in {:?}",
            model_dir.display(),
            start.elapsed()
        );
        Self::new(engine, vocab, config)
    }
}

impl<E: InferenceEngine> CaptionGenerator<E> {
    pub fn new(engine: E, vocab: Vocabulary, config: BeamConfig) -> Result<Self, CaptionError> {
        config.validate()?;
        Ok(Self {
            engine,
            vocab,
            config,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn config(&self) -> &BeamConfig {
        &self.config
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Ranked captions for an already decoded and resized image tensor.
    pub fn caption(&mut self, image: &ArrayViewD<f32>) -> Result<Vec<Caption>, CaptionError> {
        let start = Instant::now();
        let hypotheses = beam_search(&mut self.engine, image, &self.vocab, &self.config)
            .inspect_err(|err| log::error!("Caption decoding failed: {err}"))?;

        let captions: Vec<Caption> = hypotheses
            .into_iter()
            .map(|h| Caption::from_hypothesis(h, &self.vocab))
            .collect();
        log::info!(
            "Generated {} caption(s) in {:?}",
            captions.len(),
            start.elapsed()
        );
        Ok(captions)
    }
}
