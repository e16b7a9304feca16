use std::time::Instant;

use ndarray::ArrayViewD;

use crate::config::BeamConfig;
use crate::engine::InferenceEngine;
use crate::error::CaptionError;
use crate::vocabulary::{TokenId, Vocabulary};

use super::session::StepExpander;
use super::state::{Child, Hypothesis};
use super::top_n::TopN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One decoder step ran; sizes of the two frontiers afterwards.
    Expanded { partial: usize, complete: usize },
    /// Nothing left to extend, either by starvation or the length bound.
    Done,
}

/// In-progress beam search over a single image.
pub struct DecodeRun<S> {
    partial: TopN<Hypothesis<S>>,
    complete: TopN<Hypothesis<S>>,
    expander: StepExpander,
    end_id: TokenId,
    steps: usize,
    max_steps: usize,
    done: bool,
}

impl<S: Clone> DecodeRun<S> {
    /// Validates the configuration and seeds the partial frontier with the
    /// start token and the primed decoder state.
    pub fn start(
        config: &BeamConfig,
        vocab: &Vocabulary,
        initial_state: S,
    ) -> Result<Self, CaptionError> {
        config.validate()?;
        if vocab.is_empty() {
            return Err(CaptionError::Vocabulary("vocabulary is empty".into()));
        }

        let mut partial = TopN::new(config.beam_size);
        partial.insert(Hypothesis::seed(vocab.start_id(), initial_state));

        Ok(Self {
            partial,
            complete: TopN::new(config.beam_size),
            expander: StepExpander::new(config, vocab.end_id()),
            end_id: vocab.end_id(),
            steps: 0,
            max_steps: config.max_caption_length - 1,
            done: false,
        })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn partial(&self) -> &TopN<Hypothesis<S>> {
        &self.partial
    }

    pub fn complete(&self) -> &TopN<Hypothesis<S>> {
        &self.complete
    }

    pub fn step<E>(&mut self, engine: &mut E) -> Result<StepOutcome, CaptionError>
    where
        E: InferenceEngine<State = S>,
    {
        if self.done || self.steps >= self.max_steps {
            self.done = true;
            return Ok(StepOutcome::Done);
        }

        let batch = self.partial.drain();
        if batch.is_empty() {
            log::debug!("No partial captions left after {} step(s)", self.steps);
            self.done = true;
            return Ok(StepOutcome::Done);
        }

        let children = match self.expander.expand(engine, &batch) {
            Ok(children) => children,
            Err(err) => {
                self.done = true;
                return Err(err);
            }
        };
        for child in children {
            match child {
                Child::Complete(h) => {
                    debug_assert!(h.is_complete(self.end_id));
                    self.complete.insert(h);
                }
                Child::Partial(h) => self.partial.insert(h),
            }
        }
        self.steps += 1;

        log::debug!(
            "Step {}: batch={} partial={} complete={}",
            self.steps,
            batch.len(),
            self.partial.len(),
            self.complete.len()
        );

        Ok(StepOutcome::Expanded {
            partial: self.partial.len(),
            complete: self.complete.len(),
        })
    }

    /// Ranked results: completed captions when there are any, otherwise the
    /// surviving partial ones. The two sets are never mixed.
    pub fn finish(mut self) -> Vec<Hypothesis<S>> {
        if self.complete.is_empty() {
            log::debug!("No caption reached the end token, reporting partial captions");
            self.partial.drain()
        } else {
            self.complete.drain()
        }
    }
}

/// Runs a full beam search: prime, step until done, rank.
pub fn beam_search<E: InferenceEngine>(
    engine: &mut E,
    image: &ArrayViewD<f32>,
    vocab: &Vocabulary,
    config: &BeamConfig,
) -> Result<Vec<Hypothesis<E::State>>, CaptionError> {
    config.validate()?;

    let start = Instant::now();
    let initial_state = engine.prime_decoder(image)?;
    log::debug!("Decoder primed in {:?}", start.elapsed());

    let mut run = DecodeRun::start(config, vocab, initial_state)?;
    while let StepOutcome::Expanded { .. } = run.step(engine)? {}

    let steps = run.steps();
    let results = run.finish();
    log::debug!(
        "Beam search finished after {} step(s) with {} caption(s) in {:?}",
        steps,
        results.len(),
        start.elapsed()
    );
    Ok(results)
}
