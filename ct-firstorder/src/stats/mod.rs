//! 一阶统计特征.
//!
//! 所有统计量都逐行独立计算, 并跳过 `NaN` (无效体素). 因此某一行全部无效时,
//! 不会影响同一样本矩阵中其它行的结果.

pub mod policy;
mod row;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use itertools::izip;
use ndarray::{Array1, Array2, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sample::SampleMatrix;
use crate::FeatureError;

use row::ValidRow;

/// 一阶统计特征.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum FirstOrderFeature {
    /// 均值.
    Mean,

    /// 方差, 定义为总体标准差的平方.
    Variance,

    /// 偏度 `m3 / m2^1.5`. 平坦区域为 0.
    Skewness,

    /// 峰度 `m4 / m2^2`. 平坦区域为 0.
    Kurtosis,

    /// 中位数.
    Median,

    /// 最小值.
    Minimum,

    /// 第 10 百分位数.
    Percentile10,

    /// 第 90 百分位数.
    Percentile90,

    /// 最大值.
    Maximum,

    /// 四分位距 `P75 - P25`.
    InterquartileRange,

    /// 极差 `max - min`.
    Range,

    /// 平均绝对偏差.
    MeanAbsoluteDeviation,

    /// 稳健平均绝对偏差, 只考虑 `[P10, P90]` 内的值.
    RobustMeanAbsoluteDeviation,

    /// 中位数绝对偏差.
    MedianAbsoluteDeviation,

    /// 变异系数 `std / mean`. 无定义时为 0.
    CoefficientOfVariation,

    /// 四分位离散系数 `(P75 - P25) / (P75 + P25)`. 无定义时为 0.
    QuartileCoefficientOfDispersion,

    /// 能量 `sum((v + shift)^2)`.
    Energy,

    /// 均方根 `sqrt(sum((v + shift)^2) / n)`.
    RootMeanSquared,

    /// 总体标准差.
    StandardDeviation,
}

impl FirstOrderFeature {
    /// 全部特征, 按声明顺序排列. 结果的列顺序与此一致.
    pub const ALL: [FirstOrderFeature; 19] = {
        use FirstOrderFeature::*;
        [
            Mean,
            Variance,
            Skewness,
            Kurtosis,
            Median,
            Minimum,
            Percentile10,
            Percentile90,
            Maximum,
            InterquartileRange,
            Range,
            MeanAbsoluteDeviation,
            RobustMeanAbsoluteDeviation,
            MedianAbsoluteDeviation,
            CoefficientOfVariation,
            QuartileCoefficientOfDispersion,
            Energy,
            RootMeanSquared,
            StandardDeviation,
        ]
    };

    /// 在 [`Self::ALL`] 中的位置.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 对外公开的特征名.
    pub const fn name(self) -> &'static str {
        use FirstOrderFeature::*;
        match self {
            Mean => "Mean",
            Variance => "Variance",
            Skewness => "Skewness",
            Kurtosis => "Kurtosis",
            Median => "Median",
            Minimum => "Minimum",
            Percentile10 => "10Percentile",
            Percentile90 => "90Percentile",
            Maximum => "Maximum",
            InterquartileRange => "InterquartileRange",
            Range => "Range",
            MeanAbsoluteDeviation => "MeanAbsoluteDeviation",
            RobustMeanAbsoluteDeviation => "RobustMeanAbsoluteDeviation",
            MedianAbsoluteDeviation => "MedianAbsoluteDeviation",
            CoefficientOfVariation => "CoefficientOfVariation",
            QuartileCoefficientOfDispersion => "QuartileCoefficientOfDispersion",
            Energy => "Energy",
            RootMeanSquared => "RootMeanSquared",
            StandardDeviation => "StandardDeviation",
        }
    }
}

impl Display for FirstOrderFeature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FirstOrderFeature {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| FeatureError::UnknownFeature(s.to_string()))
    }
}

/// 需要计算的特征集合.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureSet {
    bits: u32,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FeatureSet {
    /// 全部特征.
    #[inline]
    pub const fn all() -> Self {
        Self {
            bits: (1 << FirstOrderFeature::ALL.len()) - 1,
        }
    }

    /// 空集合.
    #[inline]
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    /// 是否包含 `feature`.
    #[inline]
    pub const fn contains(&self, feature: FirstOrderFeature) -> bool {
        self.bits & (1 << feature.index()) != 0
    }

    /// 启用 `feature`.
    #[inline]
    pub fn enable(&mut self, feature: FirstOrderFeature) {
        self.bits |= 1 << feature.index();
    }

    /// 禁用 `feature`.
    #[inline]
    pub fn disable(&mut self, feature: FirstOrderFeature) {
        self.bits &= !(1 << feature.index());
    }

    /// 按名称启用特征. 名称未知时返回 `Err(FeatureError::UnknownFeature)`.
    pub fn enable_by_name(&mut self, name: &str) -> Result<(), FeatureError> {
        self.enable(name.parse()?);
        Ok(())
    }

    /// 启用的特征个数.
    #[inline]
    pub const fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// 是否没有启用任何特征.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// 按 [`FirstOrderFeature::ALL`] 的顺序迭代启用的特征.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = FirstOrderFeature> + '_ {
        FirstOrderFeature::ALL
            .into_iter()
            .filter(|f| self.contains(*f))
    }
}

impl FromIterator<FirstOrderFeature> for FeatureSet {
    fn from_iter<T: IntoIterator<Item = FirstOrderFeature>>(iter: T) -> Self {
        let mut set = Self::none();
        iter.into_iter().for_each(|f| set.enable(f));
        set
    }
}

/// 对样本矩阵的每一行计算 `features`, 返回形状为 `(行数, features.len())` 的矩阵.
///
/// `shift` 只影响能量和均方根. 若整个样本矩阵不含任何元素, 均方根为 0.
pub fn evaluate_many(
    matrix: &SampleMatrix,
    features: &[FirstOrderFeature],
    shift: f64,
) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros((matrix.rows(), features.len()));
    let data = matrix.data();
    let zip = Zip::from(out.rows_mut()).and(data.rows());

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            zip.par_for_each(|o, row| {
                let r = ValidRow::new(row);
                izip!(o, features).for_each(|(v, f)| *v = r.eval(*f, shift));
            });
        } else {
            zip.for_each(|o, row| {
                let r = ValidRow::new(row);
                izip!(o, features).for_each(|(v, f)| *v = r.eval(*f, shift));
            });
        }
    }

    if matrix.is_empty() {
        for (j, _) in features
            .iter()
            .enumerate()
            .filter(|(_, f)| **f == FirstOrderFeature::RootMeanSquared)
        {
            out.column_mut(j).fill(0.0);
        }
    }
    out
}

/// 对样本矩阵的每一行计算 `feature`.
pub fn evaluate(matrix: &SampleMatrix, feature: FirstOrderFeature, shift: f64) -> Array1<f64> {
    evaluate_many(matrix, &[feature], shift).column(0).to_owned()
}
