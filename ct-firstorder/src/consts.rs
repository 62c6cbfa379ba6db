//! 通用常量.

/// 默认 kernel 半径 (体素个数).
pub const DEFAULT_KERNEL_RADIUS: u32 = 1;

/// 默认强度偏移量. 计算能量类特征前会加到每个体素值上.
pub const DEFAULT_VOXEL_ARRAY_SHIFT: f64 = 0.0;

/// 默认体素分辨率 (毫米), 按照 `(z, h, w)` 顺序.
pub const DEFAULT_SPACING: [f64; 3] = [1.0; 3];

/// 体数据的维度个数.
pub const NDIM: usize = 3;

/// 计算熵时用于避免 `log2(0)` 的极小量.
pub const ENTROPY_EPSILON: f64 = f64::EPSILON;

/// 特征计算中用到的百分位.
pub mod percentile {
    /// 第 10 百分位.
    pub const P10: f64 = 10.0;

    /// 第 25 百分位 (下四分位数).
    pub const P25: f64 = 25.0;

    /// 第 50 百分位 (中位数).
    pub const P50: f64 = 50.0;

    /// 第 75 百分位 (上四分位数).
    pub const P75: f64 = 75.0;

    /// 第 90 百分位.
    pub const P90: f64 = 90.0;
}
