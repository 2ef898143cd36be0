//! Removal of candidates crossing the image boundary.

use crate::common::*;

/// Returns the indices of the boxes lying within `[0, height] x [0, width]`,
/// in increasing order.
pub fn inside_indices<R>(boxes: &[R], height: usize, width: usize) -> Vec<usize>
where
    R: Rect<Type = f64>,
{
    let height = height as f64;
    let width = width as f64;

    boxes
        .iter()
        .enumerate()
        .filter(|(_, rect)| rect.is_inside(height, width))
        .map(|(index, _)| index)
        .collect()
}

/// Drops every box with `t < 0`, `l < 0`, `b > height` or `r > width`.
///
/// Surviving boxes keep their relative order, but their indices shift. Use
/// [inside_indices] to map the filtered boxes back to the input.
pub fn filter_out_of_bounds<R>(boxes: &[R], height: usize, width: usize) -> Vec<R>
where
    R: Rect<Type = f64> + Clone,
{
    let height_f = height as f64;
    let width_f = width as f64;

    let inside: Vec<R> = boxes
        .iter()
        .filter(|rect| rect.is_inside(height_f, width_f))
        .cloned()
        .collect();

    debug!(
        "removed {} of {} candidates crossing the {}x{} image boundary",
        boxes.len() - inside.len(),
        boxes.len(),
        height,
        width
    );

    inside
}
