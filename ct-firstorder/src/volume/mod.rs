//! 体数据的 padding 与掩膜处理.
//!
//! 所有操作都基于输入的拷贝, 原始体数据不会被修改. padding 后,
//! 原坐标系中的 `(z, h, w)` 对应 padding 坐标系中的 `(z + r, h + r, w + r)`,
//! 其中 `r` 为 padding 宽度 (即 kernel 半径).

use ndarray::{s, Array3, ArrayView3, Zip};
use num::ToPrimitive;

use crate::{FeatureError, FeatureResult, Idx3d, Offset3d};

/// 检查 `actual` 是否与 `expected` 一致.
#[inline]
pub(crate) fn check_shape(what: &'static str, expected: Idx3d, actual: Idx3d) -> FeatureResult<()> {
    if expected != actual {
        return Err(FeatureError::ShapeMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// 每一维两侧各扩展 `radius` 后的形状.
#[inline]
pub fn padded_shape((z, h, w): Idx3d, radius: usize) -> Idx3d {
    (z + 2 * radius, h + 2 * radius, w + 2 * radius)
}

/// 以 `fill` 为边界值, 将 `inner` 填充到 padding 后体数据的中心区域.
fn pad_with<A: Clone>(inner: Array3<A>, radius: usize, fill: A) -> Array3<A> {
    if radius == 0 {
        return inner;
    }
    let mut out = Array3::from_elem(padded_shape(inner.dim(), radius), fill);
    let (z, h, w) = inner.dim();
    out.slice_mut(s![radius..radius + z, radius..radius + h, radius..radius + w])
        .assign(&inner);
    out
}

/// 将强度体数据转换为 `f64`, 把 ROI 外 (`mask` 为 `false`) 的体素设置为 `NaN`,
/// 再在每一维两侧各填充 `radius` 层 `NaN`.
///
/// 无法用 `f64` 表示的强度值同样被视为无效 (`NaN`).
///
/// # 返回值
///
/// 当 `volume` 与 `mask` 形状不一致时返回 `Err(FeatureError::ShapeMismatch)`.
pub fn prepare_intensity<T: ToPrimitive>(
    volume: ArrayView3<T>,
    mask: ArrayView3<bool>,
    radius: usize,
) -> FeatureResult<Array3<f64>> {
    check_shape("mask", volume.dim(), mask.dim())?;
    let inner = Zip::from(&volume)
        .and(&mask)
        .map_collect(|v, &m| if m { v.to_f64().unwrap_or(f64::NAN) } else { f64::NAN });
    Ok(pad_with(inner, radius, f64::NAN))
}

/// 在每一维两侧各填充 `radius` 层 `false`.
pub fn prepare_mask(mask: ArrayView3<bool>, radius: usize) -> Array3<bool> {
    pad_with(mask.to_owned(), radius, false)
}

/// 将离散化体数据转换为灰度级下标 (在 `gray_levels` 中的位置),
/// 再在每一维两侧各填充 `radius` 层 `None`.
///
/// ROI 外的体素, 以及取值不在 `gray_levels` 中的体素均为 `None`,
/// 它们不计入任何灰度级. `gray_levels` 必须严格递增.
pub fn prepare_levels(
    discretized: ArrayView3<u32>,
    mask: ArrayView3<bool>,
    gray_levels: &[u32],
    radius: usize,
) -> FeatureResult<Array3<Option<u32>>> {
    check_shape("mask", discretized.dim(), mask.dim())?;
    debug_assert!(gray_levels.windows(2).all(|w| w[0] < w[1]));
    let inner = Zip::from(&discretized).and(&mask).map_collect(|v, &m| {
        m.then(|| gray_levels.binary_search(v).ok())
            .flatten()
            .map(|i| i as u32)
    });
    Ok(pad_with(inner, radius, None))
}

/// padding 后的只读体数据集合. 构建后不再修改, 可以在多个线程间共享.
#[derive(Clone, Debug)]
pub struct PaddedRoi {
    /// 强度值. 无效体素为 `NaN`.
    intensity: Array3<f64>,

    /// ROI 掩膜. 决定整体模式的样本和默认的评估体素.
    roi_mask: Array3<bool>,

    /// 灰度级下标.
    levels: Array3<Option<u32>>,

    /// 灰度级个数.
    n_levels: usize,

    /// padding 宽度.
    radius: usize,

    /// 原始 (未 padding) 形状.
    shape: Idx3d,
}

impl PaddedRoi {
    /// 构建 padding 后的体数据.
    ///
    /// `masked_kernel` 为 `false` 时, ROI 外但在图像内的体素在 kernel 采样时仍然有效
    /// (强度值与灰度级都会保留).
    /// 整体模式始终只使用 ROI 内体素.
    pub fn new<T: ToPrimitive>(
        image: ArrayView3<T>,
        mask: ArrayView3<bool>,
        discretized: ArrayView3<u32>,
        gray_levels: &[u32],
        radius: usize,
        masked_kernel: bool,
    ) -> FeatureResult<Self> {
        let shape = image.dim();
        check_shape("mask", shape, mask.dim())?;
        check_shape("discretized image", shape, discretized.dim())?;

        let full;
        let kernel_source = if masked_kernel {
            mask.reborrow()
        } else {
            full = Array3::from_elem(shape, true);
            full.view()
        };

        Ok(Self {
            intensity: prepare_intensity(image, kernel_source, radius)?,
            roi_mask: prepare_mask(mask, radius),
            levels: prepare_levels(discretized, kernel_source, gray_levels, radius)?,
            n_levels: gray_levels.len(),
            radius,
            shape,
        })
    }

    /// 强度值 (padding 坐标系).
    #[inline]
    pub fn intensity(&self) -> ArrayView3<'_, f64> {
        self.intensity.view()
    }

    /// ROI 掩膜 (padding 坐标系).
    #[inline]
    pub fn roi_mask(&self) -> ArrayView3<'_, bool> {
        self.roi_mask.view()
    }

    /// 灰度级下标 (padding 坐标系).
    #[inline]
    pub fn levels(&self) -> ArrayView3<'_, Option<u32>> {
        self.levels.view()
    }

    /// 灰度级个数.
    #[inline]
    pub fn n_levels(&self) -> usize {
        self.n_levels
    }

    /// padding 宽度.
    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// 原始 (未 padding) 形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.shape
    }

    /// 检查原坐标系中的索引是否合法.
    #[inline]
    pub fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape;
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 原坐标系 -> padding 坐标系.
    #[inline]
    pub fn to_padded(&self, (z, h, w): Idx3d) -> Idx3d {
        (z + self.radius, h + self.radius, w + self.radius)
    }

    /// padding 坐标系中 `center + offset`. 若 `offset` 超出 padding 宽度, 结果会越界.
    #[inline]
    pub fn shifted((z, h, w): Idx3d, (dz, dh, dw): Offset3d) -> Idx3d {
        (
            z.wrapping_add_signed(dz),
            h.wrapping_add_signed(dh),
            w.wrapping_add_signed(dw),
        )
    }

    /// ROI 内体素个数.
    #[inline]
    pub fn roi_len(&self) -> usize {
        self.roi_mask.iter().filter(|m| **m).count()
    }

    /// 按行优先序收集 ROI 内全部体素的坐标 (原坐标系).
    pub fn roi_coords(&self) -> Vec<Idx3d> {
        let r = self.radius;
        self.roi_mask
            .indexed_iter()
            .filter(|(_, m)| **m)
            .map(|((z, h, w), _)| (z - r, h - r, w - r))
            .collect()
    }
}
