//! Common imports from external crates.

pub use anyhow::{ensure, Result};
pub use num_traits::{Float, Num, ToPrimitive, Zero};
pub use serde::{Deserialize, Deserializer, Serialize, Serializer};
