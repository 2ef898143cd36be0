//! Checked box geometry: intersection, union and IoU.
//!
//! Every function validates both boxes first and fails with [InvalidBoxError]
//! instead of returning a meaningless area for a box with reversed corners.

use crate::{
    common::*,
    rect::{Rect, RectFloat},
};

/// The default epsilon added to the union area in [iou].
pub const IOU_EPSILON: f64 = 1e-8;

/// The error raised when a box has `t > b`, `l > r` or a NaN corner.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid box {tlbr:?}: b >= t and r >= l must hold")]
pub struct InvalidBoxError {
    pub tlbr: [f64; 4],
}

impl InvalidBoxError {
    pub fn new<T>(t: T, l: T, b: T, r: T) -> Self
    where
        T: ToPrimitive,
    {
        let conv = |value: T| value.to_f64().unwrap_or(f64::NAN);
        Self {
            tlbr: [conv(t), conv(l), conv(b), conv(r)],
        }
    }
}

/// Computes the overlapping area of two boxes.
///
/// Boxes that do not overlap yield zero, never a negative area.
pub fn intersection_area<A, B>(lhs: &A, rhs: &B) -> Result<f64>
where
    A: Rect<Type = f64>,
    B: Rect<Type = f64>,
{
    lhs.ensure_valid()?;
    rhs.ensure_valid()?;

    let y = lhs.t().max(rhs.t());
    let x = lhs.l().max(rhs.l());
    let h = lhs.b().min(rhs.b()) - y;
    let w = lhs.r().min(rhs.r()) - x;

    let area = if h >= 0.0 && w >= 0.0 { h * w } else { 0.0 };
    Ok(area)
}

/// Computes `area(lhs) + area(rhs) - intersection_area(lhs, rhs)`.
pub fn union_area<A, B>(lhs: &A, rhs: &B) -> Result<f64>
where
    A: Rect<Type = f64>,
    B: Rect<Type = f64>,
{
    let inter = intersection_area(lhs, rhs)?;
    Ok(lhs.h() * lhs.w() + rhs.h() * rhs.w() - inter)
}

/// Computes the intersection-over-union ratio of two boxes.
///
/// With `use_epsilon`, [IOU_EPSILON] is added to the union area so that two
/// disjoint zero-area boxes yield zero. Without it, that case divides zero by
/// zero and yields NaN.
pub fn iou<A, B>(lhs: &A, rhs: &B, use_epsilon: bool) -> Result<f64>
where
    A: Rect<Type = f64>,
    B: Rect<Type = f64>,
{
    let epsilon = if use_epsilon { IOU_EPSILON } else { 0.0 };
    let inter = intersection_area(lhs, rhs)?;
    let union = union_area(lhs, rhs)?;
    Ok(inter / (union + epsilon))
}
