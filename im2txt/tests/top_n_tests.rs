use im2txt_lib::decoder::{Hypothesis, Scored, TopN};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: usize,
    score: f32,
}

impl Scored for Item {
    fn score(&self) -> f32 {
        self.score
    }
}

fn items(scores: &[f32]) -> Vec<Item> {
    scores
        .iter()
        .enumerate()
        .map(|(id, &score)| Item { id, score })
        .collect()
}

/// Coarse buckets so equal scores show up often.
fn bucketed_scores() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec((0u8..8).prop_map(|b| -f32::from(b)), 0..60)
}

proptest! {
    #[test]
    fn size_never_exceeds_capacity(
        capacity in 0usize..8,
        scores in bucketed_scores()
    ) {
        let mut top = TopN::new(capacity);
        for item in items(&scores) {
            top.insert(item);
            prop_assert!(top.len() <= capacity);
        }
        prop_assert_eq!(top.len(), capacity.min(scores.len()));
    }

    #[test]
    fn drain_returns_best_n_with_insertion_order_ties(
        capacity in 1usize..8,
        scores in bucketed_scores()
    ) {
        let all = items(&scores);

        let mut top = TopN::new(capacity);
        top.extend(all.clone());
        let drained = top.drain();

        let mut expected = all;
        // stable sort keeps insertion order among equal scores
        expected.sort_by(|a, b| b.score.total_cmp(&a.score));
        expected.truncate(capacity);

        prop_assert_eq!(drained, expected);
        prop_assert!(top.is_empty());
    }
}

#[test]
fn eviction_drops_the_lowest_score() {
    let mut top = TopN::new(2);
    top.insert(Item { id: 0, score: -1.0 });
    top.insert(Item { id: 1, score: -3.0 });
    assert_eq!(top.min_score(), Some(-3.0));

    top.insert(Item { id: 2, score: -2.0 });
    assert_eq!(top.min_score(), Some(-2.0));
    let ids: Vec<usize> = top.drain().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![0, 2]);
}

#[test]
fn later_insertion_loses_a_tie_at_capacity() {
    let mut top = TopN::new(1);
    top.insert(Item { id: 0, score: -1.0 });
    top.insert(Item { id: 1, score: -1.0 });
    assert_eq!(top.drain(), vec![Item { id: 0, score: -1.0 }]);
}

#[test]
fn drained_container_can_be_refilled() {
    let mut top = TopN::new(2);
    top.extend(items(&[-1.0, -2.0]));
    assert_eq!(top.drain().len(), 2);
    assert_eq!(top.drain().len(), 0);

    top.insert(Item { id: 9, score: 0.0 });
    assert_eq!(top.len(), 1);
    assert_eq!(top.capacity(), 2);
}

#[test]
fn hypotheses_rank_by_score() {
    let seed = Hypothesis::seed(0, ());
    let likely = seed.extend(2, 0.9, ());
    let unlikely = seed.extend(3, 0.1, ());

    let mut top = TopN::new(1);
    top.insert(unlikely);
    top.insert(likely);
    let best = top.drain();
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].tokens(), &[0, 2]);
}
