//! 运行时错误.

use thiserror::Error;

use crate::stats::FirstOrderFeature;
use crate::Idx3d;

/// 特征计算的结构性错误.
///
/// 数值上的退化情况 (平坦区域, 空样本, 灰度级总数为 0) 不属于错误,
/// 它们会被就地处理为确定的结果. 这里只包含会使整个请求失败的情况.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// 体数据形状与强度体数据不一致.
    #[error("shape mismatch on {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// 出错的输入名称.
        what: &'static str,
        /// 强度体数据的形状.
        expected: Idx3d,
        /// 实际形状.
        actual: Idx3d,
    },

    /// 评估坐标超出体数据范围.
    #[error("evaluation coordinate #{index} {coord:?} is outside volume of shape {shape:?}")]
    CoordinateOutOfBound {
        /// 该坐标在评估序列中的位置.
        index: usize,
        /// 坐标本身 (未 padding 的坐标系).
        coord: Idx3d,
        /// 体数据形状.
        shape: Idx3d,
    },

    /// kernel 半径必须至少为 1.
    #[error("kernel radius must be at least 1, got {0}")]
    InvalidKernelRadius(u32),

    /// 强制 2D 时指定的固定轴不存在.
    #[error("force-2D dimension must be in 0..3, got {0}")]
    InvalidForce2dDimension(usize),

    /// 体素分辨率必须是有限正数.
    #[error("voxel spacing must be finite and positive, got {0:?}")]
    InvalidSpacing([f64; 3]),

    /// 分批计算时每批的体素个数不能为 0.
    #[error("voxel batch size must be positive")]
    InvalidVoxelBatch,

    /// 偏移量表的范围超出了 padding 宽度, 邻域查找会越界.
    #[error("kernel offsets reach {extent} voxels but volumes are padded by {radius}")]
    KernelExceedsPadding {
        /// 偏移量分量绝对值的最大值.
        extent: usize,
        /// padding 宽度 (kernel 半径).
        radius: usize,
    },

    /// 未知的特征名称.
    #[error("unknown first order feature `{0}`")]
    UnknownFeature(String),

    /// 请求的特征在当前配置中被禁用.
    #[error("feature `{0}` is disabled by the current settings")]
    DisabledFeature(FirstOrderFeature),
}

/// 特征计算结果.
pub type FeatureResult<T> = Result<T, FeatureError>;
