//! Per-stage configuration of anchor generation and target assignment.

use crate::{common::*, ratio::Ratio, shape::StridePolicy};

/// The configuration of both detector stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The region proposal network stage.
    #[serde(default = "StageConfig::region_proposal")]
    pub rpn: StageConfig,
    /// The region of interest classifier stage.
    #[serde(default = "StageConfig::region_of_interest")]
    pub roi: StageConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file '{}'", path.display()))?;
        let config = json5::from_str(&text)
            .with_context(|| format!("unable to parse config file '{}'", path.display()))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpn: StageConfig::region_proposal(),
            roi: StageConfig::region_of_interest(),
        }
    }
}

/// The configuration of one detector stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub anchor: AnchorConfig,
    pub matching: MatchConfig,
    /// Optional minibatch balancing of the assigned labels.
    #[serde(default)]
    pub sampling: Option<SamplingConfig>,
    #[serde(default)]
    pub stride_policy: StridePolicy,
    /// Drop candidates crossing the image boundary before matching.
    #[serde(default = "default_remove_cross_boundary")]
    pub remove_cross_boundary: bool,
}

impl StageConfig {
    /// The default region proposal stage: 0.7/0.3 IoU thresholds and 256
    /// samples per image, half of them positive.
    pub fn region_proposal() -> Self {
        Self {
            anchor: AnchorConfig::default(),
            matching: MatchConfig::new(0.7, 0.3).unwrap(),
            sampling: Some(SamplingConfig::new(256, 0.5).unwrap()),
            stride_policy: StridePolicy::default(),
            remove_cross_boundary: true,
        }
    }

    /// The default region of interest stage: a single 0.5 IoU threshold and
    /// 128 samples per image, a quarter of them positive.
    pub fn region_of_interest() -> Self {
        Self {
            anchor: AnchorConfig::default(),
            matching: MatchConfig::new(0.5, 0.5).unwrap(),
            sampling: Some(SamplingConfig::new(128, 0.25).unwrap()),
            stride_policy: StridePolicy::default(),
            remove_cross_boundary: true,
        }
    }
}

fn default_remove_cross_boundary() -> bool {
    true
}

/// The aspect ratios and scales of the anchors placed at every location.
///
/// A ratio `r` gives anchors of height `stride * scale * sqrt(r)` and width
/// `stride * scale * sqrt(1 / r)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAnchorConfig", into = "RawAnchorConfig")]
pub struct AnchorConfig {
    ratios: Vec<R64>,
    scales: Vec<R64>,
}

impl AnchorConfig {
    pub fn new<R, S>(ratios: R, scales: S) -> Result<Self>
    where
        R: IntoIterator<Item = f64>,
        S: IntoIterator<Item = f64>,
    {
        let to_positive = |name: &str, values: Vec<f64>| -> Result<Vec<R64>> {
            ensure!(!values.is_empty(), "anchor {} must not be empty", name);
            values
                .into_iter()
                .map(|value| {
                    let value = R64::try_new(value)
                        .ok_or_else(|| format_err!("anchor {} must be finite", name))?;
                    ensure!(
                        value.raw() > 0.0,
                        "anchor {} must be positive, but get {}",
                        name,
                        value
                    );
                    Ok(value)
                })
                .collect()
        };

        let ratios = to_positive("ratios", ratios.into_iter().collect())?;
        let scales = to_positive("scales", scales.into_iter().collect())?;
        Ok(Self { ratios, scales })
    }

    pub fn ratios(&self) -> &[R64] {
        &self.ratios
    }

    pub fn scales(&self) -> &[R64] {
        &self.scales
    }

    /// Number of anchors per feature map location.
    pub fn num_anchors_per_location(&self) -> usize {
        self.ratios.len() * self.scales.len()
    }
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self::new([0.5, 1.0, 2.0], [8.0, 16.0, 32.0]).unwrap()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAnchorConfig {
    ratios: Vec<f64>,
    scales: Vec<f64>,
}

impl TryFrom<RawAnchorConfig> for AnchorConfig {
    type Error = Error;

    fn try_from(raw: RawAnchorConfig) -> Result<Self, Self::Error> {
        Self::new(raw.ratios, raw.scales)
    }
}

impl From<AnchorConfig> for RawAnchorConfig {
    fn from(config: AnchorConfig) -> Self {
        Self {
            ratios: config.ratios.iter().map(|value| value.raw()).collect(),
            scales: config.scales.iter().map(|value| value.raw()).collect(),
        }
    }
}

/// The IoU thresholds of the label assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMatchConfig", into = "RawMatchConfig")]
pub struct MatchConfig {
    pos_iou_thr: Ratio,
    neg_iou_thr: Ratio,
}

impl MatchConfig {
    pub fn new(pos_iou_thr: f64, neg_iou_thr: f64) -> Result<Self> {
        let pos_iou_thr = Ratio::try_from(pos_iou_thr).context("invalid positive IoU threshold")?;
        let neg_iou_thr = Ratio::try_from(neg_iou_thr).context("invalid negative IoU threshold")?;
        ensure!(
            neg_iou_thr <= pos_iou_thr,
            "negative IoU threshold {} must not exceed positive IoU threshold {}",
            neg_iou_thr,
            pos_iou_thr
        );
        Ok(Self {
            pos_iou_thr,
            neg_iou_thr,
        })
    }

    /// Candidates whose best IoU reaches this threshold are positive.
    pub fn pos_iou_thr(&self) -> Ratio {
        self.pos_iou_thr
    }

    /// Candidates whose best IoU is below this threshold are negative.
    pub fn neg_iou_thr(&self) -> Ratio {
        self.neg_iou_thr
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawMatchConfig {
    pos_iou_thr: f64,
    neg_iou_thr: f64,
}

impl TryFrom<RawMatchConfig> for MatchConfig {
    type Error = Error;

    fn try_from(raw: RawMatchConfig) -> Result<Self, Self::Error> {
        Self::new(raw.pos_iou_thr, raw.neg_iou_thr)
    }
}

impl From<MatchConfig> for RawMatchConfig {
    fn from(config: MatchConfig) -> Self {
        Self {
            pos_iou_thr: config.pos_iou_thr.to_f64(),
            neg_iou_thr: config.neg_iou_thr.to_f64(),
        }
    }
}

/// Minibatch balancing options.
///
/// The positive budget is derived once at construction from the total
/// sample count and the positive fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSamplingConfig", into = "RawSamplingConfig")]
pub struct SamplingConfig {
    num_samples: usize,
    positive_fraction: Ratio,
    num_positive_samples: usize,
}

impl SamplingConfig {
    pub fn new(num_samples: usize, positive_fraction: f64) -> Result<Self> {
        ensure!(num_samples > 0, "num_samples must be positive");
        let positive_fraction =
            Ratio::try_from(positive_fraction).context("invalid positive sample fraction")?;
        let num_positive_samples = (num_samples as f64 * positive_fraction.to_f64()).floor() as usize;

        Ok(Self {
            num_samples,
            positive_fraction,
            num_positive_samples,
        })
    }

    /// Total number of labelled (non-ignored) candidates per image.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn positive_fraction(&self) -> Ratio {
        self.positive_fraction
    }

    /// Upper bound of positive candidates per image.
    pub fn num_positive_samples(&self) -> usize {
        self.num_positive_samples
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSamplingConfig {
    num_samples: usize,
    positive_fraction: f64,
}

impl TryFrom<RawSamplingConfig> for SamplingConfig {
    type Error = Error;

    fn try_from(raw: RawSamplingConfig) -> Result<Self, Self::Error> {
        Self::new(raw.num_samples, raw.positive_fraction)
    }
}

impl From<SamplingConfig> for RawSamplingConfig {
    fn from(config: SamplingConfig) -> Self {
        Self {
            num_samples: config.num_samples,
            positive_fraction: config.positive_fraction.to_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.rpn.anchor.num_anchors_per_location(), 9);
        assert_eq!(config.rpn.matching.pos_iou_thr(), 0.7);
        assert_eq!(config.rpn.matching.neg_iou_thr(), 0.3);
        assert_eq!(config.roi.matching.pos_iou_thr(), 0.5);
        assert_eq!(config.rpn.sampling.unwrap().num_positive_samples(), 128);
        assert_eq!(config.roi.sampling.unwrap().num_positive_samples(), 32);
    }

    #[test]
    fn anchor_config_rejects_bad_values() {
        assert!(AnchorConfig::new([], [8.0]).is_err());
        assert!(AnchorConfig::new([1.0], [0.0]).is_err());
        assert!(AnchorConfig::new([-0.5], [8.0]).is_err());
        assert!(AnchorConfig::new([f64::INFINITY], [8.0]).is_err());
    }

    #[test]
    fn match_config_rejects_reversed_thresholds() {
        assert!(MatchConfig::new(0.3, 0.7).is_err());
        assert!(MatchConfig::new(1.2, 0.3).is_err());
        assert!(MatchConfig::new(0.5, 0.5).is_ok());
    }

    #[test]
    fn derived_positive_budget() {
        let sampling = SamplingConfig::new(10, 0.25).unwrap();
        assert_eq!(sampling.num_positive_samples(), 2);
        assert!(SamplingConfig::new(0, 0.5).is_err());
        assert!(SamplingConfig::new(8, 1.5).is_err());
    }

    #[test]
    fn deserialize_stage_config() {
        let text = r#"{
            anchor: { ratios: [1.0], scales: [2.0, 4.0] },
            matching: { pos_iou_thr: 0.6, neg_iou_thr: 0.2 },
            sampling: { num_samples: 64, positive_fraction: 0.5 },
        }"#;
        let config: StageConfig = json5::from_str(text).unwrap();
        assert_eq!(config.anchor.num_anchors_per_location(), 2);
        assert_eq!(config.stride_policy, StridePolicy::PerAxis);
        assert!(config.remove_cross_boundary);
        assert_eq!(config.sampling.unwrap().num_positive_samples(), 32);

        let bad = r#"{
            anchor: { ratios: [1.0], scales: [2.0] },
            matching: { pos_iou_thr: 0.2, neg_iou_thr: 0.6 },
        }"#;
        assert!(json5::from_str::<StageConfig>(bad).is_err());
    }
}
