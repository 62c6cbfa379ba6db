//! 样本矩阵与灰度级占有率的提取.
//!
//! 样本矩阵的每一行对应一个评估点, 每一列对应一个被采样的体素.
//! 无效体素以 `NaN` 保留在矩阵中, 由统计模块负责跳过.

mod occupancy;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Zip};

use crate::kernel::KernelOffsets;
use crate::volume::PaddedRoi;
use crate::{FeatureError, FeatureResult, Idx3d};

pub use occupancy::Occupancy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 样本矩阵. 行数等于评估点个数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleMatrix {
    data: Array2<f64>,
}

impl SampleMatrix {
    /// 直接初始化. `NaN` 代表无效体素.
    #[inline]
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// 评估点个数.
    #[inline]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// 每个评估点采样的体素个数 (含无效体素).
    #[inline]
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// 矩阵不含任何元素 (与是否存在 `NaN` 无关).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// 获取第 `index` 行. 越界时 panic.
    #[inline]
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.row(index)
    }

    /// 第 `index` 行的有效体素个数.
    #[inline]
    pub fn valid_count(&self, index: usize) -> usize {
        self.row(index).iter().filter(|v| !v.is_nan()).count()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<f64> {
        self.data
    }
}

/// 一次采样的结果: 样本矩阵与对应的灰度级占有率, 二者行数一致.
#[derive(Clone, Debug)]
pub struct Samples {
    /// 样本矩阵.
    pub matrix: SampleMatrix,

    /// 灰度级占有率.
    pub occupancy: Occupancy,
}

/// 评估点集合及其采样方式.
///
/// 所有实现都是 `PaddedRoi` 的纯函数: 相同的输入总是得到相同的样本.
pub trait SampleStrategy {
    /// 评估点个数, 即输出的行数.
    fn len(&self) -> usize;

    /// 是否不存在评估点.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 从 `roi` 中采样.
    fn gather(&self, roi: &PaddedRoi) -> FeatureResult<Samples>;
}

/// 整体模式: ROI 内全部体素构成唯一的一行.
#[derive(Copy, Clone, Debug, Default)]
pub struct WholeRegion;

impl SampleStrategy for WholeRegion {
    #[inline]
    fn len(&self) -> usize {
        1
    }

    fn gather(&self, roi: &PaddedRoi) -> FeatureResult<Samples> {
        let mut values = Vec::with_capacity(roi.roi_len());
        let mut counts = Array2::<f64>::zeros((1, roi.n_levels()));

        Zip::from(roi.roi_mask())
            .and(roi.intensity())
            .and(roi.levels())
            .for_each(|&m, &v, &level| {
                if !m {
                    return;
                }
                values.push(v);
                if let Some(level) = level {
                    counts[(0, level as usize)] += 1.0;
                }
            });

        Ok(Samples {
            matrix: SampleMatrix::new(Array1::from(values).insert_axis(Axis(0))),
            occupancy: Occupancy::from_counts(counts),
        })
    }
}

/// 逐体素模式: 每个评估体素以其 kernel 邻域为一行样本.
#[derive(Copy, Clone, Debug)]
pub struct KernelWindow<'a> {
    coords: &'a [Idx3d],
    offsets: &'a KernelOffsets,
}

impl<'a> KernelWindow<'a> {
    /// `coords` 为原坐标系 (未 padding) 中的评估体素, `offsets` 为共享的偏移量表.
    #[inline]
    pub fn new(coords: &'a [Idx3d], offsets: &'a KernelOffsets) -> Self {
        Self { coords, offsets }
    }

    /// 评估体素.
    #[inline]
    pub fn coords(&self) -> &'a [Idx3d] {
        self.coords
    }

    /// 检查全部评估体素都在体数据范围内, 且偏移量不超出 padding.
    pub fn validate(&self, roi: &PaddedRoi) -> FeatureResult<()> {
        self.offsets.check_padding(roi.radius())?;
        match self.coords.iter().position(|c| !roi.check(c)) {
            Some(index) => Err(FeatureError::CoordinateOutOfBound {
                index,
                coord: self.coords[index],
                shape: roi.shape(),
            }),
            None => Ok(()),
        }
    }
}

/// 采样单个评估体素的邻域, 写入 `values` 和 `counts`.
///
/// 无效体素原样写入 (`NaN`), 并且不计入任何灰度级.
fn gather_row(
    roi: &PaddedRoi,
    offsets: &KernelOffsets,
    coord: Idx3d,
    mut values: ArrayViewMut1<f64>,
    mut counts: ArrayViewMut1<f64>,
) {
    let center = roi.to_padded(coord);
    let (intensity, levels) = (roi.intensity(), roi.levels());
    for (v, offset) in values.iter_mut().zip(offsets.iter()) {
        let pos = PaddedRoi::shifted(center, offset);
        *v = intensity[pos];
        if let Some(level) = levels[pos] {
            counts[level as usize] += 1.0;
        }
    }
}

impl SampleStrategy for KernelWindow<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.coords.len()
    }

    fn gather(&self, roi: &PaddedRoi) -> FeatureResult<Samples> {
        self.validate(roi)?;

        let n = self.coords.len();
        let mut values = Array2::<f64>::from_elem((n, self.offsets.len()), f64::NAN);
        let mut counts = Array2::<f64>::zeros((n, roi.n_levels()));
        let coords = ArrayView1::from(self.coords);

        let zip = Zip::from(values.rows_mut())
            .and(counts.rows_mut())
            .and(&coords);

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                zip.par_for_each(|v, c, &coord| gather_row(roi, self.offsets, coord, v, c));
            } else {
                zip.for_each(|v, c, &coord| gather_row(roi, self.offsets, coord, v, c));
            }
        }

        debug_assert_eq!(values.len_of(Axis(0)), n);
        Ok(Samples {
            matrix: SampleMatrix::new(values),
            occupancy: Occupancy::from_counts(counts),
        })
    }
}
