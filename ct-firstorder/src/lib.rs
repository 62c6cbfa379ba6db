#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 计算 3D CT 感兴趣区域 (ROI) 的一阶 (强度分布) 统计特征.
//!
//! 该 crate 目前仅提供 `safe` 接口. 图像读取、重采样以及灰度离散化 (binning)
//! 都不在本 crate 的职责范围内: 调用方需要直接提供强度体数据、ROI 掩膜、
//! 离散化后的体数据和灰度级集合.
//!
//! # 两种计算形态
//!
//! 1. **整体聚合**: 将 ROI 内全部体素视为一个样本, 每个特征得到一个标量.
//! 2. **逐体素局部**: 对每个给定的评估体素, 以其 kernel 邻域 (包括其自身)
//!   为样本计算同样的特征, 得到与评估坐标一一对应的特征图.
//!
//! 两种形态共享同一套统计公式. 区别仅在于样本矩阵的收集方式,
//! 见 [`sample::SampleStrategy`].
//!
//! # 注意
//!
//! 1. 体素坐标统一按照 `(z, h, w)` 顺序给出, 与 `ndarray` 的轴顺序一致.
//! 2. 无效体素 (ROI 外, 或 padding 区域) 以 `NaN` 表示,
//!   所有统计量都会跳过它们, 而不是将其视为 0.
//! 3. 数值上的退化情况 (平坦区域, 空样本) 不会报错,
//!   而是按照 [`stats::policy`] 中的规则给出确定的结果.
//!   结构性错误 (形状不一致, 坐标越界, 非法配置) 会使整个请求失败, 见 [`FeatureError`].
//!
//! # 开发计划
//!
//! ### kernel 邻域偏移量生成 ✅
//!
//! 实现位于 `ct-firstorder/src/kernel`.
//!
//! ### 体数据 padding 与掩膜处理 ✅
//!
//! 实现位于 `ct-firstorder/src/volume`.
//!
//! ### 样本矩阵与灰度级占有率提取 ✅
//!
//! 整体模式与 kernel 窗口模式. 实现位于 `ct-firstorder/src/sample`.
//!
//! ### 一阶统计特征 ✅
//!
//! 19 个特征, 包括平坦区域/空样本的保护策略. 实现位于 `ct-firstorder/src/stats`.
//!
//! ### 逐体素特征图, 分批计算 ✅
//!
//! 实现位于 `ct-firstorder/src/extractor.rs`.

/// 三维索引, 按照 `(z, h, w)` 顺序.
pub type Idx3d = (usize, usize, usize);

/// 三维有符号偏移量, 分量顺序与 [`Idx3d`] 一致.
pub type Offset3d = (isize, isize, isize);

pub mod consts;

mod error;

pub mod extractor;

pub mod kernel;

pub mod prelude;

pub mod sample;

mod settings;

pub mod stats;

pub mod volume;

pub use error::{FeatureError, FeatureResult};
pub use extractor::{FeatureMaps, FeatureVector, FirstOrderExtractor, RoiInput};
pub use settings::Settings;
pub use stats::{FeatureSet, FirstOrderFeature};
