use super::{CyCxHW, Rect, TLBR_};
use crate::{common::*, InvalidBoxError};

/// Bounding box in TLBR format, that is `(y_min, x_min, y_max, x_max)`.
///
/// The fields are private so that a constructed box always satisfies
/// `t <= b` and `l <= r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TLBR<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) b: T,
    pub(crate) r: T,
}

impl<T> Rect for TLBR<T>
where
    T: Copy + Num + PartialOrd + ToPrimitive,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.t
    }

    fn l(&self) -> Self::Type {
        self.l
    }

    fn b(&self) -> Self::Type {
        self.b
    }

    fn r(&self) -> Self::Type {
        self.r
    }

    fn cy(&self) -> Self::Type {
        let one = T::one();
        let two = one + one;
        self.t + self.h() / two
    }

    fn cx(&self) -> Self::Type {
        let one = T::one();
        let two = one + one;
        self.l + self.w() / two
    }

    fn h(&self) -> Self::Type {
        self.b - self.t
    }

    fn w(&self) -> Self::Type {
        self.r - self.l
    }

    fn try_from_cycxhw(cycxhw: [Self::Type; 4]) -> Result<Self> {
        let [cy, cx, h, w] = cycxhw;
        let zero = T::zero();
        ensure!(
            h >= zero && w >= zero,
            "h and w must be non-negative, but get h={:?} w={:?}",
            h.to_f64(),
            w.to_f64()
        );

        let two = T::one() + T::one();
        let t = cy - h / two;
        let b = cy + h / two;
        let l = cx - w / two;
        let r = cx + w / two;

        Self::try_from_tlbr([t, l, b, r])
    }

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, InvalidBoxError::new(t, l, b, r));

        Ok(Self { t, l, b, r })
    }

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        let b = t + h;
        let r = l + w;
        Self::try_from_tlbr([t, l, b, r])
    }
}

impl<T> From<CyCxHW<T>> for TLBR<T>
where
    T: Copy + Num,
{
    fn from(from: CyCxHW<T>) -> Self {
        Self::from(&from)
    }
}

impl<T> From<&CyCxHW<T>> for TLBR<T>
where
    T: Copy + Num,
{
    fn from(from: &CyCxHW<T>) -> Self {
        let two = T::one() + T::one();
        let CyCxHW { cy, cx, h, w, .. } = *from;
        let t = cy - h / two;
        let l = cx - w / two;
        let b = cy + h / two;
        let r = cx + w / two;
        Self { t, l, b, r }
    }
}

impl<T> Serialize for TLBR<T>
where
    T: Copy + Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let Self { t, l, b, r } = *self;
        TLBR_ { t, l, b, r }.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for TLBR<T>
where
    T: Float + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error as _;

        let raw = TLBR_::<T>::deserialize(deserializer)?;
        Self::try_from(raw).map_err(|err| D::Error::custom(format!("{:#}", err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reversed_corners_are_rejected() {
        let err = TLBR::<f64>::try_from_tlbr([4.0, 0.0, 2.0, 2.0]).unwrap_err();
        let err = err.downcast_ref::<InvalidBoxError>().unwrap();
        assert_eq!(err.tlbr, [4.0, 0.0, 2.0, 2.0]);
    }

    #[test]
    fn cycxhw_conversion() {
        let rect = TLBR::<f64>::from_cycxhw([2.0, 2.0, 4.0, 2.0]);
        assert_eq!(rect.tlbr(), [0.0, 1.0, 4.0, 3.0]);
        assert_abs_diff_eq!(rect.cy(), 2.0);
        assert_abs_diff_eq!(rect.cx(), 2.0);
        assert_eq!(TLBR::from(rect.to_cycxhw()), rect);
    }

    #[test]
    fn deserialize_validates_corners() {
        let rect: TLBR<f64> = serde_json::from_str(r#"{"t": 1, "l": 2, "b": 3, "r": 4}"#).unwrap();
        assert_eq!(rect.tlbr(), [1.0, 2.0, 3.0, 4.0]);

        let result: Result<TLBR<f64>, _> =
            serde_json::from_str(r#"{"t": 3, "l": 2, "b": 1, "r": 4}"#);
        assert!(result.is_err());
    }
}
