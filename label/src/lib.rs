//! Training labels of anchor boxes.

use anyhow::{bail, Error, Result};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{self, Display, Formatter},
    iter::FromIterator,
};

/// The training label of a candidate box.
///
/// The integer encoding is the one consumed by the loss functions:
/// `-1` is excluded from the loss, `0` is background and `1` is foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i8)]
pub enum AnchorLabel {
    Ignore = -1,
    Negative = 0,
    Positive = 1,
}

impl AnchorLabel {
    pub fn to_i8(self) -> i8 {
        self as i8
    }

    pub fn is_positive(self) -> bool {
        self == Self::Positive
    }

    pub fn is_negative(self) -> bool {
        self == Self::Negative
    }

    pub fn is_ignored(self) -> bool {
        self == Self::Ignore
    }
}

impl Default for AnchorLabel {
    fn default() -> Self {
        Self::Ignore
    }
}

impl TryFrom<i8> for AnchorLabel {
    type Error = Error;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        let label = match value {
            -1 => Self::Ignore,
            0 => Self::Negative,
            1 => Self::Positive,
            _ => bail!("invalid anchor label {}, expect -1, 0 or 1", value),
        };
        Ok(label)
    }
}

impl From<AnchorLabel> for i8 {
    fn from(label: AnchorLabel) -> Self {
        label.to_i8()
    }
}

impl Display for AnchorLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ignore => "ignore",
            Self::Negative => "negative",
            Self::Positive => "positive",
        };
        f.write_str(text)
    }
}

impl Serialize for AnchorLabel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i8(self.to_i8())
    }
}

impl<'de> Deserialize<'de> for AnchorLabel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i8::deserialize(deserializer)?;
        Self::try_from(value).map_err(|err| D::Error::custom(format!("{:?}", err)))
    }
}

/// Number of candidates per label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelCounts {
    pub positive: usize,
    pub negative: usize,
    pub ignore: usize,
}

impl LabelCounts {
    pub fn total(&self) -> usize {
        self.positive + self.negative + self.ignore
    }
}

impl<'a> FromIterator<&'a AnchorLabel> for LabelCounts {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = &'a AnchorLabel>,
    {
        iter.into_iter().copied().collect()
    }
}

impl FromIterator<AnchorLabel> for LabelCounts {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = AnchorLabel>,
    {
        iter.into_iter()
            .fold(Self::default(), |mut counts, label| {
                match label {
                    AnchorLabel::Positive => counts.positive += 1,
                    AnchorLabel::Negative => counts.negative += 1,
                    AnchorLabel::Ignore => counts.ignore += 1,
                }
                counts
            })
    }
}

/// Converts labels to their integer encoding.
pub fn to_i8_vec(labels: &[AnchorLabel]) -> Vec<i8> {
    labels.iter().map(|&label| label.to_i8()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_encoding() {
        for label in [
            AnchorLabel::Ignore,
            AnchorLabel::Negative,
            AnchorLabel::Positive,
        ] {
            assert_eq!(AnchorLabel::try_from(label.to_i8()).unwrap(), label);
        }
        assert!(AnchorLabel::try_from(2).is_err());
        assert_eq!(AnchorLabel::default(), AnchorLabel::Ignore);
    }

    #[test]
    fn serialize_as_integers() {
        let labels = vec![
            AnchorLabel::Positive,
            AnchorLabel::Ignore,
            AnchorLabel::Negative,
        ];
        let text = serde_json::to_string(&labels).unwrap();
        assert_eq!(text, "[1,-1,0]");
        assert!(serde_json::from_str::<Vec<AnchorLabel>>("[1,3]").is_err());
    }

    #[test]
    fn count_labels() {
        let labels = [
            AnchorLabel::Positive,
            AnchorLabel::Negative,
            AnchorLabel::Negative,
            AnchorLabel::Ignore,
        ];
        let counts: LabelCounts = labels.iter().collect();
        assert_eq!(
            counts,
            LabelCounts {
                positive: 1,
                negative: 2,
                ignore: 1
            }
        );
        assert_eq!(counts.total(), labels.len());
        assert_eq!(to_i8_vec(&labels), vec![1, 0, 0, -1]);
    }
}
