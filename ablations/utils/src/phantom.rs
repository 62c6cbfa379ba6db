//! 确定性的合成体数据. 不依赖任何外部数据集, 保证每次实验的输入完全一致.

use ct_firstorder::{FeatureResult, Idx3d, RoiInput};
use ndarray::{Array3, Zip};

/// 高亮外壳的强度.
const OUTLIER: f64 = 1000.0;

/// 平坦内核的强度.
const CORE: f64 = 100.0;

/// 椭球 phantom.
///
/// ROI 为内切于体数据的椭球. 强度沿 `z` 与 `w` 方向线性增长,
/// 椭球中心附近为强度恒定的内核, 外壳上稀疏分布着高亮体素.
#[derive(Clone, Debug)]
pub struct Phantom {
    /// 强度体数据.
    pub image: Array3<f64>,

    /// ROI 掩膜.
    pub mask: Array3<bool>,

    /// 固定 bin 个数离散化后的体数据, ROI 外为 0.
    pub discretized: Array3<u32>,

    /// 灰度级集合, 即 `1..=bins`.
    pub gray_levels: Vec<u32>,
}

/// 体素 `pos` 在椭球坐标下到中心的归一化距离的平方.
fn ellipsoid_r2(pos: Idx3d, shape: Idx3d) -> f64 {
    let axis = |i: usize, n: usize| {
        let c = (n as f64 - 1.0) / 2.0;
        let a = (n as f64 / 2.0 - 1.0).max(1.0);
        ((i as f64 - c) / a).powi(2)
    };
    axis(pos.0, shape.0) + axis(pos.1, shape.1) + axis(pos.2, shape.2)
}

impl Phantom {
    /// 构建形状为 `shape` 的椭球 phantom, 离散化为 `bins` 个灰度级.
    ///
    /// `bins` 为 0 时视为 1.
    pub fn ellipsoid(shape: Idx3d, bins: u32) -> Self {
        let bins = bins.max(1);
        let (nz, _, nw) = shape;
        let mask = Array3::from_shape_fn(shape, |pos| ellipsoid_r2(pos, shape) <= 1.0);
        let image = Array3::from_shape_fn(shape, |(z, h, w)| {
            let r2 = ellipsoid_r2((z, h, w), shape);
            if r2 < 0.16 {
                CORE
            } else if r2 > 0.81 && (z + h + w) % 7 == 0 {
                OUTLIER
            } else {
                40.0 + 60.0 * z as f64 / nz as f64 + 20.0 * w as f64 / nw as f64
            }
        });

        let (lo, hi) = Zip::from(&image)
            .and(&mask)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v, &m| {
                if m {
                    (lo.min(v), hi.max(v))
                } else {
                    (lo, hi)
                }
            });
        let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };
        let discretized = Zip::from(&image).and(&mask).map_collect(|&v, &m| {
            if m {
                (((v - lo) / width).floor() as u32).min(bins - 1) + 1
            } else {
                0
            }
        });

        Self {
            image,
            mask,
            discretized,
            gray_levels: (1..=bins).collect(),
        }
    }

    /// 体数据形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.image.dim()
    }

    /// ROI 体素个数.
    pub fn roi_len(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }

    /// 作为特征提取器的输入.
    pub fn input(&self) -> FeatureResult<RoiInput<f64>> {
        RoiInput::new(
            self.image.view(),
            self.mask.view(),
            self.discretized.view(),
            &self.gray_levels,
        )
    }
}
