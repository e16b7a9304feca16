use ndarray::ArrayView1;

use crate::vocabulary::TokenId;

/// Probabilities below this are treated as zero and never extended.
pub const MIN_PROBABILITY: f32 = 1e-12;

/// A partial or complete caption. Built once and never patched: extending
/// it produces a new hypothesis with its own token buffer.
#[derive(Debug, Clone)]
pub struct Hypothesis<S> {
    tokens: Vec<TokenId>,
    state: S,
    log_probability: f32,
    score: f32,
}

impl<S> Hypothesis<S> {
    pub fn seed(start_id: TokenId, state: S) -> Self {
        Self {
            tokens: vec![start_id],
            state,
            log_probability: 0.0,
            score: 0.0,
        }
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    pub fn last_token(&self) -> TokenId {
        // tokens always holds at least the start token
        self.tokens[self.tokens.len() - 1]
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn log_probability(&self) -> f32 {
        self.log_probability
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn is_complete(&self, end_id: TokenId) -> bool {
        self.last_token() == end_id
    }

    pub fn into_parts(self) -> (Vec<TokenId>, S, f32, f32) {
        (self.tokens, self.state, self.log_probability, self.score)
    }

    /// Child hypothesis that consumed `token` with probability `p` and ended
    /// up in `state`. The parent is left untouched.
    pub fn extend(&self, token: TokenId, p: f32, state: S) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.extend_from_slice(&self.tokens);
        tokens.push(token);
        let log_probability = self.log_probability + p.ln();
        Self {
            tokens,
            state,
            log_probability,
            score: log_probability,
        }
    }

    /// Rescores a finished hypothesis by `log_probability / len^factor`.
    /// A factor of zero keeps the raw log probability.
    pub fn normalized(mut self, factor: f32) -> Self {
        self.score = normalized_score(self.log_probability, self.tokens.len(), factor);
        self
    }
}

pub fn normalized_score(log_probability: f32, len: usize, factor: f32) -> f32 {
    if factor > 0.0 {
        log_probability / (len as f32).powf(factor)
    } else {
        log_probability
    }
}

/// Where a freshly expanded hypothesis belongs.
#[derive(Debug, Clone)]
pub enum Child<S> {
    Complete(Hypothesis<S>),
    Partial(Hypothesis<S>),
}

impl<S> Child<S> {
    pub fn hypothesis(&self) -> &Hypothesis<S> {
        match self {
            Self::Complete(h) | Self::Partial(h) => h,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// The `k` most likely tokens, highest first. Equal probabilities keep their
/// order in the distribution. Non-finite entries are ignored.
pub fn top_tokens(probabilities: &ArrayView1<f32>, k: usize) -> Vec<(TokenId, f32)> {
    let mut candidates: Vec<(TokenId, f32)> = probabilities
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_finite())
        .map(|(i, &p)| (i as TokenId, p))
        .collect();

    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    candidates.truncate(k);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn top_tokens_keeps_distribution_order_on_ties() {
        let probs = array![0.1f32, 0.6, 0.2, 0.1];
        let top = top_tokens(&probs.view(), 3);
        assert_eq!(
            top.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            vec![1, 2, 0]
        );
    }

    #[test]
    fn top_tokens_skips_nan() {
        let probs = array![f32::NAN, 0.3, 0.7];
        let top = top_tokens(&probs.view(), 3);
        assert_eq!(top, vec![(2, 0.7), (1, 0.3)]);
    }

    #[test]
    fn normalized_score_disabled_at_zero() {
        assert_eq!(normalized_score(-2.0, 5, 0.0), -2.0);
        assert!((normalized_score(-2.0, 5, 1.0) + 0.4).abs() < 1e-6);
    }
}
