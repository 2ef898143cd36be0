//! Common imports from external crates.

pub use anyhow::{ensure, format_err, Context, Error, Result};
pub use bbox::{prelude::*, CyCxHW, TLBR};
pub use itertools::iproduct;
pub use label::{AnchorLabel, LabelCounts};
pub use log::{debug, warn};
pub use ndarray::{Array2, ArrayView2, Axis};
pub use noisy_float::prelude::*;
pub use rand::Rng;
pub use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
pub use std::{
    collections::BTreeSet,
    fmt::{self, Display, Formatter},
    path::Path,
};
