//! Pairwise IoU between candidates and ground truth boxes.

use crate::common::*;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Computes the `N x M` IoU matrix of `N` candidates against `M` ground truth
/// boxes, where entry `(i, j)` is `iou(candidates[i], ground_truth[j])` with
/// the default epsilon.
///
/// An empty ground truth set yields an `N x 0` matrix. Invalid boxes on
/// either side fail with [bbox::InvalidBoxError].
pub fn compute_iou_matrix<A, B>(candidates: &[A], ground_truth: &[B]) -> Result<Array2<f64>>
where
    A: Rect<Type = f64> + Sync,
    B: Rect<Type = f64> + Sync,
{
    let num_candidates = candidates.len();
    let num_gt = ground_truth.len();

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = candidates
        .par_iter()
        .enumerate()
        .map(|(index, candidate)| iou_row(index, candidate, ground_truth))
        .collect::<Result<_>>()?;

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| iou_row(index, candidate, ground_truth))
        .collect::<Result<_>>()?;

    let matrix = Array2::from_shape_vec((num_candidates, num_gt), rows.concat())?;
    Ok(matrix)
}

fn iou_row<A, B>(index: usize, candidate: &A, ground_truth: &[B]) -> Result<Vec<f64>>
where
    A: Rect<Type = f64>,
    B: Rect<Type = f64>,
{
    ground_truth
        .iter()
        .enumerate()
        .map(|(gt_index, gt)| {
            bbox::iou(candidate, gt, true).with_context(|| {
                format!(
                    "unable to compute IoU of candidate {} and ground truth {}",
                    index, gt_index
                )
            })
        })
        .collect()
}
