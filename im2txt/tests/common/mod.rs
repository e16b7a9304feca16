#![allow(dead_code)]

use std::collections::HashMap;

use im2txt_lib::{CaptionError, InferenceEngine, StepOutput, TokenId, Vocabulary};
use ndarray::{Array2, ArrayViewD};

pub fn toy_vocab() -> Vocabulary {
    Vocabulary::from_words(["<S>", "</S>", "a", "b"]).expect("toy vocabulary")
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic engine: the distribution depends only on the last token,
/// and the state counts how many tokens were consumed after the start token.
pub struct TableEngine {
    pub default: Vec<f32>,
    pub table: HashMap<TokenId, Vec<f32>>,
    pub calls: Vec<Vec<TokenId>>,
    pub fail_on_call: Option<usize>,
    pub fail_on_prime: bool,
    pub empty_on_call: Option<usize>,
    pub drop_last_row: bool,
}

impl TableEngine {
    pub fn uniform(distribution: Vec<f32>) -> Self {
        Self {
            default: distribution,
            table: HashMap::new(),
            calls: Vec::new(),
            fail_on_call: None,
            fail_on_prime: false,
            empty_on_call: None,
            drop_last_row: false,
        }
    }

    pub fn with(mut self, token: TokenId, distribution: Vec<f32>) -> Self {
        self.table.insert(token, distribution);
        self
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn failing_prime(mut self) -> Self {
        self.fail_on_prime = true;
        self
    }
}

impl InferenceEngine for TableEngine {
    type State = usize;

    fn prime_decoder(&mut self, _image: &ArrayViewD<f32>) -> Result<usize, CaptionError> {
        if self.fail_on_prime {
            return Err(CaptionError::Engine("encoder failed".into()));
        }
        Ok(0)
    }

    fn step_decoder(
        &mut self,
        tokens: &[TokenId],
        states: &[&usize],
    ) -> Result<StepOutput<usize>, CaptionError> {
        assert_eq!(tokens.len(), states.len());
        self.calls.push(tokens.to_vec());
        if self.fail_on_call == Some(self.calls.len()) {
            return Err(CaptionError::Engine(format!(
                "step {} failed",
                self.calls.len()
            )));
        }

        let rows = if self.drop_last_row {
            tokens.len() - 1
        } else {
            tokens.len()
        };
        let width = if self.empty_on_call == Some(self.calls.len()) {
            0
        } else {
            self.default.len()
        };
        let mut probabilities = Array2::zeros((rows, width));
        for (mut row, token) in probabilities.outer_iter_mut().zip(tokens) {
            let dist = self.table.get(token).unwrap_or(&self.default);
            for (slot, p) in row.iter_mut().zip(dist) {
                *slot = *p;
            }
        }

        Ok(StepOutput {
            probabilities,
            states: states.iter().take(rows).map(|s| **s + 1).collect(),
        })
    }
}

pub fn dummy_image() -> ndarray::ArrayD<f32> {
    ndarray::ArrayD::zeros(ndarray::IxDyn(&[1, 2, 2, 3]))
}
