//! Dense anchor generation over a feature map grid.

use crate::{
    common::*,
    config::AnchorConfig,
    shape::{Shape, Stride, StridePolicy},
};

/// The image-space center of one feature map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorCenter {
    pub cy: usize,
    pub cx: usize,
}

/// Lists the centers of all feature map cells in row-major order.
///
/// The center of cell `k` along an axis is `stride * (k + 1) - stride / 2`
/// with integer division, so odd strides round the half-stride down.
pub fn anchor_centers(fmap_shape: &Shape, stride: &Stride) -> Vec<AnchorCenter> {
    let centers = |size: usize, stride: usize| {
        (1..=size).map(move |index| stride * index - stride / 2)
    };

    iproduct!(
        centers(fmap_shape.height, stride.y),
        centers(fmap_shape.width, stride.x)
    )
    .map(|(cy, cx)| AnchorCenter { cy, cx })
    .collect()
}

/// Lists the anchor shapes placed at every center, centered at the origin.
///
/// Ratios form the outer loop and scales the inner loop.
pub fn anchor_shapes(anchor: &AnchorConfig, stride: &Stride) -> Result<Vec<CyCxHW<f64>>> {
    let stride_y = stride.y as f64;
    let stride_x = stride.x as f64;

    iproduct!(anchor.ratios(), anchor.scales())
        .map(|(&ratio, &scale)| {
            let ratio = ratio.raw();
            let scale = scale.raw();
            let h = stride_y * scale * ratio.sqrt();
            let w = stride_x * scale * (1.0 / ratio).sqrt();
            CyCxHW::try_from_cycxhw([0.0, 0.0, h, w])
                .with_context(|| format!("invalid anchor for ratio {} and scale {}", ratio, scale))
        })
        .collect()
}

/// Generates every candidate box of a feature map.
///
/// The boxes are ordered by center in row-major order first, then by ratio,
/// then by scale. The result has `h * w * ratios * scales` boxes, and
/// downstream IoU rows and labels are aligned to this order.
pub fn generate_candidates(
    image_shape: &Shape,
    fmap_shape: &Shape,
    anchor: &AnchorConfig,
    policy: StridePolicy,
) -> Result<Vec<TLBR<f64>>> {
    let stride = Stride::new(image_shape, fmap_shape, policy)?;
    let centers = anchor_centers(fmap_shape, &stride);
    let shapes = anchor_shapes(anchor, &stride)?;

    let candidates: Vec<TLBR<f64>> = centers
        .iter()
        .flat_map(|center| {
            shapes
                .iter()
                .map(move |shape| TLBR::from(shape.with_center(center.cy as f64, center.cx as f64)))
        })
        .collect();

    debug!(
        "generated {} candidates on a {}x{} grid with stride {:?}",
        candidates.len(),
        fmap_shape.height,
        fmap_shape.width,
        stride
    );

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn unit_anchor() -> AnchorConfig {
        AnchorConfig::new([1.0], [1.0]).unwrap()
    }

    #[test]
    fn centers_are_row_major() {
        let stride = Stride { y: 4, x: 8 };
        let centers = anchor_centers(&Shape::new(1, 2, 3), &stride);
        let expect: Vec<_> = [(2, 4), (2, 12), (2, 20), (6, 4), (6, 12), (6, 20)]
            .iter()
            .map(|&(cy, cx)| AnchorCenter { cy, cx })
            .collect();
        assert_eq!(centers, expect);
    }

    #[test]
    fn odd_stride_center() {
        let centers = anchor_centers(&Shape::new(1, 1, 1), &Stride { y: 5, x: 5 });
        assert_eq!(centers, vec![AnchorCenter { cy: 3, cx: 3 }]);
    }

    #[test]
    fn unit_anchors_tile_the_image() {
        let candidates = generate_candidates(
            &Shape::new(3, 16, 16),
            &Shape::new(3, 4, 4),
            &unit_anchor(),
            StridePolicy::PerAxis,
        )
        .unwrap();

        assert_eq!(candidates.len(), 16);
        assert_eq!(candidates[0].tlbr(), [0.0, 0.0, 4.0, 4.0]);
        assert_eq!(candidates[1].tlbr(), [0.0, 4.0, 4.0, 8.0]);
        assert_eq!(candidates[4].tlbr(), [4.0, 0.0, 8.0, 4.0]);
        assert_eq!(candidates[15].tlbr(), [12.0, 12.0, 16.0, 16.0]);
    }

    #[test]
    fn ratio_outer_scale_inner() {
        let anchor = AnchorConfig::new([0.5, 2.0], [1.0, 2.0]).unwrap();
        let candidates = generate_candidates(
            &Shape::new(3, 8, 8),
            &Shape::new(3, 1, 1),
            &anchor,
            StridePolicy::PerAxis,
        )
        .unwrap();
        assert_eq!(candidates.len(), 4);

        let sizes: Vec<_> = candidates.iter().map(|rect| (rect.h(), rect.w())).collect();
        let expect = [
            (8.0 * 0.5f64.sqrt(), 8.0 * 2f64.sqrt()),
            (16.0 * 0.5f64.sqrt(), 16.0 * 2f64.sqrt()),
            (8.0 * 2f64.sqrt(), 8.0 * 0.5f64.sqrt()),
            (16.0 * 2f64.sqrt(), 16.0 * 0.5f64.sqrt()),
        ];
        for ((h, w), (eh, ew)) in sizes.into_iter().zip(expect) {
            assert_abs_diff_eq!(h, eh, epsilon = 1e-9);
            assert_abs_diff_eq!(w, ew, epsilon = 1e-9);
        }

        for rect in &candidates {
            assert_abs_diff_eq!(rect.cy(), 4.0, epsilon = 1e-9);
            assert_abs_diff_eq!(rect.cx(), 4.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn height_only_policy_reuses_row_stride() {
        let image = Shape::new(3, 8, 16);
        let fmap = Shape::new(3, 2, 2);

        let per_axis =
            generate_candidates(&image, &fmap, &unit_anchor(), StridePolicy::PerAxis).unwrap();
        assert_eq!(per_axis[1].tlbr(), [0.0, 8.0, 4.0, 16.0]);

        let height_only =
            generate_candidates(&image, &fmap, &unit_anchor(), StridePolicy::HeightOnly).unwrap();
        assert_eq!(height_only[1].tlbr(), [0.0, 4.0, 4.0, 8.0]);
    }
}
