//! 特征计算配置.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_KERNEL_RADIUS, DEFAULT_SPACING, DEFAULT_VOXEL_ARRAY_SHIFT, NDIM};
use crate::stats::FeatureSet;
use crate::{FeatureError, FeatureResult};

/// 一阶特征计算配置.
///
/// 该配置在构建 [`crate::FirstOrderExtractor`] 时被校验一次,
/// 之后只读. 若要修改参数, 你应该创建新的实例.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Settings {
    /// kernel 半径, 同时也是 padding 宽度.
    kernel_radius: u32,

    /// 计算能量 / 均方根前加到每个体素值上的偏移量.
    /// 对于 CT 数据, 可以设为 (例如) 2000 以保证非负.
    voxel_array_shift: f64,

    /// 是否把 kernel 限制在二维平面内.
    force_2d: bool,

    /// `force_2d` 时被固定 (偏移量恒为 0) 的轴.
    force_2d_dimension: usize,

    /// 体素分辨率 (毫米). 只做透传, 不参与计算.
    spacing: [f64; 3],

    /// kernel 是否只采样 ROI 内体素.
    masked_kernel: bool,

    /// 逐体素模式下每批计算的体素个数. `None` 代表一次计算全部.
    voxel_batch: Option<usize>,

    /// 需要计算的特征.
    enabled: FeatureSet,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kernel_radius: DEFAULT_KERNEL_RADIUS,
            voxel_array_shift: DEFAULT_VOXEL_ARRAY_SHIFT,
            force_2d: false,
            force_2d_dimension: 0,
            spacing: DEFAULT_SPACING,
            masked_kernel: true,
            voxel_batch: None,
            enabled: FeatureSet::all(),
        }
    }
}

impl Settings {
    /// 默认配置, 同 `Settings::default()`.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 kernel 半径.
    #[inline]
    pub fn with_kernel_radius(mut self, radius: u32) -> Self {
        self.kernel_radius = radius;
        self
    }

    /// 设置强度偏移量.
    #[inline]
    pub fn with_voxel_array_shift(mut self, shift: f64) -> Self {
        self.voxel_array_shift = shift;
        self
    }

    /// 将 kernel 限制在垂直于 `dimension` 轴的平面内.
    #[inline]
    pub fn with_force_2d(mut self, dimension: usize) -> Self {
        self.force_2d = true;
        self.force_2d_dimension = dimension;
        self
    }

    /// 设置体素分辨率 (毫米), 按照 `(z, h, w)` 顺序.
    #[inline]
    pub fn with_spacing(mut self, spacing: [f64; 3]) -> Self {
        self.spacing = spacing;
        self
    }

    /// 设置 kernel 是否只采样 ROI 内体素.
    #[inline]
    pub fn with_masked_kernel(mut self, masked: bool) -> Self {
        self.masked_kernel = masked;
        self
    }

    /// 设置逐体素模式的分批大小.
    #[inline]
    pub fn with_voxel_batch(mut self, batch: usize) -> Self {
        self.voxel_batch = Some(batch);
        self
    }

    /// 设置需要计算的特征.
    #[inline]
    pub fn with_features(mut self, enabled: FeatureSet) -> Self {
        self.enabled = enabled;
        self
    }

    /// kernel 半径.
    #[inline]
    pub fn kernel_radius(&self) -> u32 {
        self.kernel_radius
    }

    /// 强度偏移量.
    #[inline]
    pub fn voxel_array_shift(&self) -> f64 {
        self.voxel_array_shift
    }

    /// 若强制 2D, 返回被固定的轴; 否则返回 `None`.
    #[inline]
    pub fn force_2d_dimension(&self) -> Option<usize> {
        self.force_2d.then_some(self.force_2d_dimension)
    }

    /// 体素分辨率 (毫米).
    #[inline]
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// kernel 是否只采样 ROI 内体素.
    #[inline]
    pub fn masked_kernel(&self) -> bool {
        self.masked_kernel
    }

    /// 逐体素模式的分批大小.
    #[inline]
    pub fn voxel_batch(&self) -> Option<usize> {
        self.voxel_batch
    }

    /// 需要计算的特征.
    #[inline]
    pub fn enabled(&self) -> &FeatureSet {
        &self.enabled
    }

    /// 检查配置是否合法. 非法时返回第一个发现的错误.
    pub fn validate(&self) -> FeatureResult<()> {
        if self.kernel_radius == 0 {
            return Err(FeatureError::InvalidKernelRadius(self.kernel_radius));
        }
        if self.force_2d && self.force_2d_dimension >= NDIM {
            return Err(FeatureError::InvalidForce2dDimension(
                self.force_2d_dimension,
            ));
        }
        if !self.spacing.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err(FeatureError::InvalidSpacing(self.spacing));
        }
        if self.voxel_batch == Some(0) {
            return Err(FeatureError::InvalidVoxelBatch);
        }
        Ok(())
    }
}
