//! The complete target assignment pipeline of one detector stage.

use crate::{
    anchor::generate_candidates,
    assign::{assign_labels_with, LabelAssignment},
    boundary::inside_indices,
    common::*,
    config::{Config, StageConfig},
    iou_matrix::compute_iou_matrix,
    sample::sample_labels,
    shape::Shape,
};

/// The detector stage a pipeline instance serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    RegionProposal,
    RegionOfInterest,
}

impl Stage {
    pub const ALL: [Stage; 2] = [Stage::RegionProposal, Stage::RegionOfInterest];

    /// Selects the configuration of this stage.
    pub fn config<'a>(&self, config: &'a Config) -> &'a StageConfig {
        match self {
            Self::RegionProposal => &config.rpn,
            Self::RegionOfInterest => &config.roi,
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::RegionProposal => "rpn",
            Self::RegionOfInterest => "roi",
        };
        f.write_str(text)
    }
}

/// The training targets of one image.
#[derive(Debug, Clone)]
pub struct StageTargets {
    /// Number of anchors before the boundary filter.
    pub num_anchors: usize,
    /// The matched candidates.
    pub candidates: Vec<TLBR<f64>>,
    /// Index of each candidate in the dense anchor grid.
    pub anchor_indices: Vec<usize>,
    /// IoU of candidates (rows) against ground truth boxes (columns).
    pub iou_matrix: Array2<f64>,
    pub assignment: LabelAssignment,
    /// The labels after minibatch sampling, if sampling is enabled.
    pub sampled_labels: Option<Vec<AnchorLabel>>,
}

impl StageTargets {
    /// The labels to train with: sampled labels if present, assigned labels
    /// otherwise.
    pub fn labels(&self) -> &[AnchorLabel] {
        self.sampled_labels
            .as_deref()
            .unwrap_or(&self.assignment.labels)
    }

    /// Scatters the labels back onto the dense anchor grid. Anchors removed
    /// by the boundary filter are ignored.
    pub fn dense_labels(&self) -> Vec<AnchorLabel> {
        let mut dense = vec![AnchorLabel::Ignore; self.num_anchors];
        self.anchor_indices
            .iter()
            .zip(self.labels())
            .for_each(|(&index, &label)| dense[index] = label);
        dense
    }
}

/// Runs anchor generation, boundary filtering, IoU matching and label
/// assignment for one stage.
#[derive(Debug, Clone)]
pub struct AnchorTargeter {
    stage: Stage,
    config: StageConfig,
}

impl AnchorTargeter {
    pub fn new(stage: Stage, config: StageConfig) -> Self {
        Self { stage, config }
    }

    pub fn from_config(stage: Stage, config: &Config) -> Self {
        Self::new(stage, stage.config(config).clone())
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Computes the targets of one image.
    ///
    /// Sampling needs a random generator; it is skipped when `rng` is `None`
    /// or the stage has no sampling configuration.
    pub fn run<G, R>(
        &self,
        image_shape: &Shape,
        fmap_shape: &Shape,
        ground_truth: &[G],
        rng: Option<&mut R>,
    ) -> Result<StageTargets>
    where
        G: Rect<Type = f64> + Sync,
        R: Rng + ?Sized,
    {
        let stage = self.stage;
        let StageConfig {
            ref anchor,
            ref matching,
            ref sampling,
            stride_policy,
            remove_cross_boundary,
        } = self.config;

        let anchors = generate_candidates(image_shape, fmap_shape, anchor, stride_policy)
            .with_context(|| format!("{} stage: unable to generate anchors", stage))?;
        let num_anchors = anchors.len();

        let (candidates, anchor_indices) = if remove_cross_boundary {
            let indices = inside_indices(&anchors, image_shape.height, image_shape.width);
            let candidates = indices.iter().map(|&index| anchors[index]).collect();
            (candidates, indices)
        } else {
            (anchors, (0..num_anchors).collect())
        };

        let iou_matrix = compute_iou_matrix(&candidates, ground_truth)
            .with_context(|| format!("{} stage: unable to compute IoU matrix", stage))?;
        let assignment = assign_labels_with(iou_matrix.view(), ground_truth.len(), matching)
            .with_context(|| format!("{} stage: unable to assign labels", stage))?;

        let sampled_labels = match (sampling, rng) {
            (Some(sampling), Some(rng)) => {
                Some(sample_labels(&assignment.labels, sampling, rng))
            }
            _ => None,
        };

        debug!(
            "{} stage: {} anchors, {} candidates, {} ground truth, {:?}",
            stage,
            num_anchors,
            candidates.len(),
            ground_truth.len(),
            assignment.counts()
        );

        Ok(StageTargets {
            num_anchors,
            candidates,
            anchor_indices,
            iou_matrix,
            assignment,
            sampled_labels,
        })
    }
}
