use crate::{common::*, rect::Rect, TLBR};

/// Unchecked bounding box record in TLBR format.
///
/// This is the form boxes take in configuration and input files. Converting
/// it into a [TLBR] validates the corners. It also implements [Rect] so the
/// checked geometry functions in [crate::iou] can report malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TLBR_<T> {
    pub t: T,
    pub l: T,
    pub b: T,
    pub r: T,
}

impl<T> Rect for TLBR_<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> T {
        self.t
    }

    fn l(&self) -> T {
        self.l
    }

    fn b(&self) -> T {
        self.b
    }

    fn r(&self) -> T {
        self.r
    }

    fn cy(&self) -> T {
        let two = T::one() + T::one();
        self.t + (self.b - self.t) / two
    }

    fn cx(&self) -> T {
        let two = T::one() + T::one();
        self.l + (self.r - self.l) / two
    }

    fn h(&self) -> T {
        self.b - self.t
    }

    fn w(&self) -> T {
        self.r - self.l
    }

    fn try_from_tlbr(tlbr: [T; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        Ok(Self { t, l, b, r })
    }

    fn try_from_tlhw(tlhw: [T; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        Ok(Self {
            t,
            l,
            b: t + h,
            r: l + w,
        })
    }

    fn try_from_cycxhw(cycxhw: [T; 4]) -> Result<Self> {
        let [cy, cx, h, w] = cycxhw;
        let two = T::one() + T::one();
        Ok(Self {
            t: cy - h / two,
            l: cx - w / two,
            b: cy + h / two,
            r: cx + w / two,
        })
    }
}

impl<T> TryFrom<TLBR_<T>> for TLBR<T>
where
    T: Float,
{
    type Error = anyhow::Error;

    fn try_from(from: TLBR_<T>) -> Result<Self, Self::Error> {
        Self::try_from(&from)
    }
}

impl<T> TryFrom<&TLBR_<T>> for TLBR<T>
where
    T: Float,
{
    type Error = anyhow::Error;

    fn try_from(from: &TLBR_<T>) -> Result<Self, Self::Error> {
        let TLBR_ { t, l, b, r } = *from;
        Self::try_from_tlbr([t, l, b, r])
    }
}

impl<T> From<TLBR<T>> for TLBR_<T> {
    fn from(from: TLBR<T>) -> Self {
        let TLBR { t, l, b, r } = from;
        Self { t, l, b, r }
    }
}
