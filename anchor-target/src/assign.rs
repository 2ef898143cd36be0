//! Label assignment from an IoU matrix.

use crate::{common::*, config::MatchConfig};

/// The error raised when labels are requested without any ground truth box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot assign labels without ground truth boxes")]
pub struct EmptyGroundTruthError;

/// The error raised when ground truth is given but no candidate is left to
/// label, typically because every anchor crosses the image boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot assign labels without candidates, {num_gt} ground truth boxes would have no positive")]
pub struct EmptyCandidatesError {
    pub num_gt: usize,
}

/// The outcome of [assign_labels].
///
/// All per-candidate vectors are index-aligned with the rows of the IoU
/// matrix, and the per-ground-truth vector with its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelAssignment {
    pub labels: Vec<AnchorLabel>,
    /// Row maxima of the IoU matrix.
    pub best_iou_per_candidate: Vec<f64>,
    /// Column of the first row maximum.
    pub best_gt_per_candidate: Vec<usize>,
    /// Column maxima of the IoU matrix.
    pub best_iou_per_gt: Vec<f64>,
    /// Rows attaining some column maximum, ties included.
    pub best_match_indices: BTreeSet<usize>,
}

impl LabelAssignment {
    pub fn counts(&self) -> LabelCounts {
        self.labels.iter().collect()
    }
}

/// Labels every candidate from its IoU against the ground truth boxes.
///
/// Starting from [AnchorLabel::Ignore], the passes below are applied in order
/// and later passes override earlier ones.
///
/// 1. Candidates whose best IoU is below `neg_iou_thr` become negative.
/// 2. Candidates whose best IoU reaches `pos_iou_thr` become positive.
/// 3. For each ground truth box, every candidate attaining its highest IoU
///    (compared with exact float equality) becomes positive, so that each
///    ground truth box has at least one positive candidate.
///
/// NaN entries propagate into the maxima. A candidate whose best IoU is NaN
/// stays ignored, and a ground truth box whose best IoU is NaN has no best
/// match.
pub fn assign_labels(
    matrix: ArrayView2<'_, f64>,
    num_gt: usize,
    pos_iou_thr: f64,
    neg_iou_thr: f64,
) -> Result<LabelAssignment> {
    let thresholds = MatchConfig::new(pos_iou_thr, neg_iou_thr)?;
    assign_labels_with(matrix, num_gt, &thresholds)
}

/// Same as [assign_labels] with thresholds from a [MatchConfig].
pub fn assign_labels_with(
    matrix: ArrayView2<'_, f64>,
    num_gt: usize,
    config: &MatchConfig,
) -> Result<LabelAssignment> {
    if num_gt == 0 || matrix.ncols() == 0 {
        return Err(EmptyGroundTruthError.into());
    }
    ensure!(
        matrix.ncols() == num_gt,
        "IoU matrix has {} columns, but {} ground truth boxes are given",
        matrix.ncols(),
        num_gt
    );
    if matrix.nrows() == 0 {
        return Err(EmptyCandidatesError { num_gt }.into());
    }

    let pos_iou_thr = config.pos_iou_thr().to_f64();
    let neg_iou_thr = config.neg_iou_thr().to_f64();

    let (best_gt_per_candidate, best_iou_per_candidate): (Vec<usize>, Vec<f64>) = matrix
        .outer_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |(best_index, best_iou), (index, &iou)| {
                    if !best_iou.is_nan() && (iou.is_nan() || iou > best_iou) {
                        (index, iou)
                    } else {
                        (best_index, best_iou)
                    }
                })
        })
        .unzip();

    let best_iou_per_gt: Vec<f64> = matrix
        .axis_iter(Axis(1))
        .map(|col| col.iter().copied().fold(f64::NEG_INFINITY, nan_max))
        .collect();

    let best_match_indices: BTreeSet<usize> = matrix
        .axis_iter(Axis(1))
        .zip(&best_iou_per_gt)
        .flat_map(|(col, &best)| {
            col.into_iter()
                .enumerate()
                .filter(move |(_, &iou)| iou == best)
                .map(|(index, _)| index)
        })
        .collect();

    let mut labels = vec![AnchorLabel::Ignore; matrix.nrows()];

    labels
        .iter_mut()
        .zip(&best_iou_per_candidate)
        .filter(|(_, &best)| best < neg_iou_thr)
        .for_each(|(label, _)| *label = AnchorLabel::Negative);

    labels
        .iter_mut()
        .zip(&best_iou_per_candidate)
        .filter(|(_, &best)| best >= pos_iou_thr)
        .for_each(|(label, _)| *label = AnchorLabel::Positive);

    best_match_indices
        .iter()
        .for_each(|&index| labels[index] = AnchorLabel::Positive);

    Ok(LabelAssignment {
        labels,
        best_iou_per_candidate,
        best_gt_per_candidate,
        best_iou_per_gt,
        best_match_indices,
    })
}

/// Like [f64::max], but NaN wins.
fn nan_max(lhs: f64, rhs: f64) -> f64 {
    if lhs.is_nan() || rhs.is_nan() {
        f64::NAN
    } else {
        lhs.max(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use AnchorLabel::*;

    #[test]
    fn best_match_overrides_thresholds() {
        let matrix = array![[0.2], [0.9]];
        let assignment = assign_labels(matrix.view(), 1, 0.7, 0.3).unwrap();
        assert_eq!(assignment.labels, vec![Negative, Positive]);
        assert_eq!(assignment.best_match_indices, BTreeSet::from([1]));

        // a low-IoU candidate that is the sole best match is forced positive
        let matrix = array![[0.2], [0.1]];
        let assignment = assign_labels(matrix.view(), 1, 0.7, 0.3).unwrap();
        assert_eq!(assignment.labels, vec![Positive, Negative]);
    }

    #[test]
    fn ties_produce_several_best_matches() {
        let matrix = array![[0.2], [0.2], [0.1]];
        let assignment = assign_labels(matrix.view(), 1, 0.7, 0.3).unwrap();
        assert_eq!(assignment.labels, vec![Positive, Positive, Negative]);
        assert_eq!(assignment.best_match_indices, BTreeSet::from([0, 1]));
    }

    #[test]
    fn middle_band_is_ignored() {
        let matrix = array![
            [0.5, 0.1],
            [0.05, 0.75],
            [0.1, 0.0],
            [0.8, 0.2],
            [0.0, 0.4],
        ];
        let assignment = assign_labels(matrix.view(), 2, 0.7, 0.3).unwrap();
        assert_eq!(
            assignment.labels,
            vec![Ignore, Positive, Negative, Positive, Ignore]
        );
        assert_eq!(assignment.best_gt_per_candidate, vec![0, 1, 0, 0, 1]);
        assert_eq!(assignment.best_iou_per_candidate, vec![0.5, 0.75, 0.1, 0.8, 0.4]);
        assert_eq!(assignment.best_iou_per_gt, vec![0.8, 0.75]);
        assert_eq!(
            assignment.counts(),
            LabelCounts {
                positive: 2,
                negative: 1,
                ignore: 2
            }
        );
    }

    #[test]
    fn best_match_set_is_deduplicated() {
        let matrix = array![[0.9, 0.6], [0.1, 0.2]];
        let assignment = assign_labels(matrix.view(), 2, 0.7, 0.3).unwrap();
        assert_eq!(assignment.best_match_indices, BTreeSet::from([0]));
        assert_eq!(assignment.labels, vec![Positive, Negative]);
    }

    #[test]
    fn every_ground_truth_has_a_positive() {
        let matrix = array![
            [0.01, 0.0, 0.3],
            [0.02, 0.05, 0.1],
            [0.0, 0.04, 0.29],
        ];
        let assignment = assign_labels(matrix.view(), 3, 0.7, 0.3).unwrap();
        for col in matrix.axis_iter(Axis(1)) {
            assert!(col
                .iter()
                .zip(&assignment.labels)
                .any(|(&iou, label)| label.is_positive() && iou > 0.0));
        }
        assert_eq!(assignment, assign_labels(matrix.view(), 3, 0.7, 0.3).unwrap());
    }

    #[test]
    fn empty_ground_truth_is_an_error() {
        let matrix = Array2::<f64>::zeros((4, 0));
        let err = assign_labels(matrix.view(), 0, 0.7, 0.3).unwrap_err();
        assert!(err.downcast_ref::<EmptyGroundTruthError>().is_some());
    }

    #[test]
    fn mismatched_ground_truth_count() {
        let matrix = Array2::<f64>::zeros((4, 2));
        let err = assign_labels(matrix.view(), 3, 0.7, 0.3).unwrap_err();
        assert!(err.downcast_ref::<EmptyGroundTruthError>().is_none());
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let matrix = Array2::<f64>::zeros((0, 2));
        let err = assign_labels(matrix.view(), 2, 0.7, 0.3).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EmptyCandidatesError>(),
            Some(&EmptyCandidatesError { num_gt: 2 })
        );
    }

    #[test]
    fn nan_rows_stay_ignored() {
        let matrix = array![[f64::NAN, 0.8], [0.1, 0.2], [0.5, 0.1]];
        let assignment = assign_labels(matrix.view(), 2, 0.7, 0.3).unwrap();
        assert!(assignment.best_iou_per_candidate[0].is_nan());
        assert_eq!(assignment.best_gt_per_candidate, vec![0, 1, 0]);
        assert!(assignment.best_iou_per_gt[0].is_nan());
        assert_eq!(assignment.best_iou_per_gt[1], 0.8);
        // the NaN column has no best match, the other one still does
        assert_eq!(assignment.best_match_indices, BTreeSet::from([0]));
        assert_eq!(assignment.labels, vec![Positive, Negative, Ignore]);

        let matrix = array![[f64::NAN], [0.1]];
        let assignment = assign_labels(matrix.view(), 1, 0.7, 0.3).unwrap();
        assert!(assignment.best_match_indices.is_empty());
        assert_eq!(assignment.labels, vec![Ignore, Negative]);
    }
}
