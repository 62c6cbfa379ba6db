//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, Offset3d};

pub use crate::{FeatureError, FeatureResult, Settings};

pub use crate::extractor::{FeatureMaps, FeatureVector, FirstOrderExtractor, RoiInput};
pub use crate::kernel::KernelOffsets;
pub use crate::sample::{KernelWindow, Occupancy, SampleStrategy, Samples, WholeRegion};
pub use crate::stats::{FeatureSet, FirstOrderFeature};
