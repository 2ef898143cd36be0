//! Minibatch balancing of assigned labels.

use crate::{common::*, config::SamplingConfig};
use itertools::Itertools;
use rand::seq::index;

/// Subsamples labels to a balanced minibatch.
///
/// At most [SamplingConfig::num_positive_samples] positives are kept, and
/// negatives fill the remaining [SamplingConfig::num_samples] budget. The
/// dropped candidates become [AnchorLabel::Ignore]. The kept candidates are
/// drawn uniformly from `rng`, so a seeded generator gives reproducible
/// results.
pub fn sample_labels<R>(
    labels: &[AnchorLabel],
    sampling: &SamplingConfig,
    rng: &mut R,
) -> Vec<AnchorLabel>
where
    R: Rng + ?Sized,
{
    let positives = indices_of(labels, AnchorLabel::Positive);
    let negatives = indices_of(labels, AnchorLabel::Negative);

    let kept_positives = choose(&positives, sampling.num_positive_samples(), rng);
    let num_negatives = sampling.num_samples() - kept_positives.len();
    let kept_negatives = choose(&negatives, num_negatives, rng);

    debug!(
        "sampled {}/{} positives and {}/{} negatives",
        kept_positives.len(),
        positives.len(),
        kept_negatives.len(),
        negatives.len()
    );

    let mut sampled = vec![AnchorLabel::Ignore; labels.len()];
    kept_positives
        .into_iter()
        .for_each(|index| sampled[index] = AnchorLabel::Positive);
    kept_negatives
        .into_iter()
        .for_each(|index| sampled[index] = AnchorLabel::Negative);
    sampled
}

fn indices_of(labels: &[AnchorLabel], target: AnchorLabel) -> Vec<usize> {
    labels
        .iter()
        .positions(|&label| label == target)
        .collect()
}

fn choose<R>(indices: &[usize], amount: usize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    if indices.len() <= amount {
        return indices.to_vec();
    }

    index::sample(rng, indices.len(), amount)
        .into_iter()
        .map(|pick| indices[pick])
        .collect()
}
