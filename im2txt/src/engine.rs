//! Contract between the beam search and the model runtime.

use ndarray::{Array2, ArrayViewD};

use crate::error::CaptionError;
use crate::vocabulary::TokenId;

/// Output of one batched decoder step: row `i` of `probabilities` and
/// `states[i]` belong to input element `i`.
#[derive(Debug, Clone)]
pub struct StepOutput<S> {
    pub probabilities: Array2<f32>,
    pub states: Vec<S>,
}

impl<S> StepOutput<S> {
    pub fn batch_len(&self) -> usize {
        self.states.len()
    }
}

pub trait InferenceEngine {
    /// Recurrent state produced after consuming a token. Never mutated once
    /// returned; cloning it must be cheap or at least side-effect free.
    type State: Clone;

    /// Runs the image encoder and returns the decoder's seed state.
    fn prime_decoder(&mut self, image: &ArrayViewD<f32>) -> Result<Self::State, CaptionError>;

    /// Feeds one token per state through the decoder in a single call.
    fn step_decoder(
        &mut self,
        tokens: &[TokenId],
        states: &[&Self::State],
    ) -> Result<StepOutput<Self::State>, CaptionError>;
}
