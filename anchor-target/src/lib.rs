//! Anchor generation and training target assignment for two-stage
//! (Faster R-CNN style) object detectors.
//!
//! The pipeline is the same for the region proposal stage and the region of
//! interest stage. Only the [StageConfig] differs.
//!
//! ```text
//! shapes + AnchorConfig -> generate_candidates -> filter_out_of_bounds
//!     -> compute_iou_matrix (with ground truth) -> assign_labels -> sample_labels
//! ```

mod common;

pub mod anchor;
pub mod assign;
pub mod boundary;
pub mod config;
pub mod iou_matrix;
pub mod ratio;
pub mod sample;
pub mod shape;
pub mod stage;

pub use anchor::*;
pub use assign::*;
pub use boundary::*;
pub use config::*;
pub use iou_matrix::*;
pub use ratio::*;
pub use sample::*;
pub use shape::*;
pub use stage::*;

pub use bbox::{iou, InvalidBoxError, TLBR, TLBR_};
pub use label::{AnchorLabel, LabelCounts};
