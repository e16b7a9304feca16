use std::time::Instant;

use crate::config::BeamConfig;
use crate::engine::InferenceEngine;
use crate::error::CaptionError;
use crate::vocabulary::TokenId;

use super::state::{top_tokens, Child, Hypothesis, MIN_PROBABILITY};

/// Grows a batch of partial captions by one token through a single engine call.
pub struct StepExpander {
    beam_size: usize,
    end_id: TokenId,
    length_normalization_factor: f32,
}

impl StepExpander {
    pub fn new(config: &BeamConfig, end_id: TokenId) -> Self {
        Self {
            beam_size: config.beam_size,
            end_id,
            length_normalization_factor: config.length_normalization_factor,
        }
    }

    pub fn expand<E: InferenceEngine>(
        &self,
        engine: &mut E,
        batch: &[Hypothesis<E::State>],
    ) -> Result<Vec<Child<E::State>>, CaptionError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        debug_assert!(batch.iter().all(|h| !h.is_complete(self.end_id)));

        let tokens: Vec<TokenId> = batch.iter().map(Hypothesis::last_token).collect();
        let states: Vec<&E::State> = batch.iter().map(Hypothesis::state).collect();

        let start = Instant::now();
        let output = engine.step_decoder(&tokens, &states)?;
        log::trace!(
            "Decoder step for batch of {} completed in {:?}",
            batch.len(),
            start.elapsed()
        );

        let rows = output.probabilities.nrows();
        if rows != batch.len() {
            return Err(CaptionError::BatchMismatch {
                expected: batch.len(),
                actual: rows,
            });
        }
        if output.batch_len() != batch.len() {
            return Err(CaptionError::BatchMismatch {
                expected: batch.len(),
                actual: output.batch_len(),
            });
        }
        if output.probabilities.ncols() == 0 {
            // Zero width is a setup problem on the seed step only.
            if batch.iter().all(|h| h.tokens().len() == 1) {
                return Err(CaptionError::EmptyDistribution);
            }
            return Err(CaptionError::Engine(
                "empty token distribution after the first step".into(),
            ));
        }

        let mut children = Vec::with_capacity(batch.len() * self.beam_size);
        for ((parent, distribution), state) in batch
            .iter()
            .zip(output.probabilities.outer_iter())
            .zip(output.states)
        {
            for (token, p) in top_tokens(&distribution, self.beam_size) {
                if p < MIN_PROBABILITY {
                    continue;
                }
                let child = parent.extend(token, p, state.clone());
                if token == self.end_id {
                    children.push(Child::Complete(
                        child.normalized(self.length_normalization_factor),
                    ));
                } else {
                    children.push(Child::Partial(child));
                }
            }
        }
        Ok(children)
    }
}
