//! Image and feature map shapes, and the stride between them.

use crate::common::*;

/// A `(channels, height, width)` shape of an image or a feature map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl Shape {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
        }
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((channels, height, width): (usize, usize, usize)) -> Self {
        Self::new(channels, height, width)
    }
}

impl From<[usize; 3]> for Shape {
    fn from([channels, height, width]: [usize; 3]) -> Self {
        Self::new(channels, height, width)
    }
}

impl Serialize for Shape {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [self.channels, self.height, self.width].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let chw = <[usize; 3]>::deserialize(deserializer)?;
        Ok(chw.into())
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.channels, self.height, self.width)
    }
}

/// How the downsample stride is derived from the image and feature map shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StridePolicy {
    /// Compute the row stride from the heights and the column stride from
    /// the widths.
    PerAxis,
    /// Use the height-derived stride on both axes.
    HeightOnly,
}

impl Default for StridePolicy {
    fn default() -> Self {
        Self::PerAxis
    }
}

/// The downsample ratio from the feature map to the image, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stride {
    pub y: usize,
    pub x: usize,
}

impl Stride {
    /// Derives the stride by integer division of the image size by the
    /// feature map size.
    ///
    /// Non-divisible shapes truncate and anisotropic strides are accepted,
    /// both with a warning.
    pub fn new(image_shape: &Shape, fmap_shape: &Shape, policy: StridePolicy) -> Result<Self> {
        ensure!(
            fmap_shape.height > 0 && fmap_shape.width > 0,
            "feature map shape {} must have non-zero height and width",
            fmap_shape
        );

        let y = image_shape.height / fmap_shape.height;
        let x = match policy {
            StridePolicy::PerAxis => image_shape.width / fmap_shape.width,
            StridePolicy::HeightOnly => y,
        };
        ensure!(
            y > 0 && x > 0,
            "feature map shape {} is larger than image shape {}",
            fmap_shape,
            image_shape
        );

        if image_shape.height % fmap_shape.height != 0 || image_shape.width % fmap_shape.width != 0
        {
            warn!(
                "image shape {} is not a multiple of feature map shape {}, anchor centers may be off by one stride",
                image_shape, fmap_shape
            );
        }

        if image_shape.width / fmap_shape.width != image_shape.height / fmap_shape.height {
            warn!(
                "row and column strides differ for image shape {} and feature map shape {} (policy {:?})",
                image_shape, fmap_shape, policy
            );
        }

        Ok(Self { y, x })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_stride() {
        let stride = Stride::new(
            &Shape::new(3, 16, 16),
            &Shape::new(3, 4, 4),
            StridePolicy::PerAxis,
        )
        .unwrap();
        assert_eq!(stride, Stride { y: 4, x: 4 });
    }

    #[test]
    fn anisotropic_stride() {
        let image = Shape::new(3, 32, 64);
        let fmap = Shape::new(512, 4, 4);

        let per_axis = Stride::new(&image, &fmap, StridePolicy::PerAxis).unwrap();
        assert_eq!(per_axis, Stride { y: 8, x: 16 });

        let height_only = Stride::new(&image, &fmap, StridePolicy::HeightOnly).unwrap();
        assert_eq!(height_only, Stride { y: 8, x: 8 });
    }

    #[test]
    fn truncating_stride() {
        let stride = Stride::new(
            &Shape::new(3, 17, 18),
            &Shape::new(3, 4, 4),
            StridePolicy::PerAxis,
        )
        .unwrap();
        assert_eq!(stride, Stride { y: 4, x: 4 });
    }

    #[test]
    fn invalid_shapes() {
        let image = Shape::new(3, 16, 16);
        assert!(Stride::new(&image, &Shape::new(3, 0, 4), StridePolicy::PerAxis).is_err());
        assert!(Stride::new(&image, &Shape::new(3, 32, 32), StridePolicy::PerAxis).is_err());
    }

    #[test]
    fn shape_serde() {
        let shape: Shape = serde_json::from_str("[3, 600, 800]").unwrap();
        assert_eq!(shape, Shape::new(3, 600, 800));
        assert_eq!(serde_json::to_string(&shape).unwrap(), "[3,600,800]");
    }
}
