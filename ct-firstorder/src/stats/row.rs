//! 单个样本行上的统计量.

use ndarray::ArrayView1;
use ordered_float::NotNan;

use super::policy::{flat_region_ratio, percentile_sorted, safe_divide, sorted_valid};
use super::FirstOrderFeature;
use crate::consts::percentile::*;

/// 一行样本中的全部有效值 (升序) 及其均值.
///
/// 有效值为空时, 位置类统计量 (均值, 中位数, 极值, 百分位数) 和离散类统计量
/// (方差, 偏度等) 均为 `NaN`; 能量为 0.
#[derive(Clone, Debug)]
pub(crate) struct ValidRow {
    sorted: Vec<NotNan<f64>>,
    mean: f64,
}

/// 升序有效值的算术平均. 为空时返回 `NaN`.
#[inline]
fn mean_of(sorted: &[NotNan<f64>]) -> f64 {
    sorted.iter().map(|v| v.into_inner()).sum::<f64>() / sorted.len() as f64
}

/// `values` 中各元素与 `center` 之差的绝对值, 升序排列.
#[inline]
fn abs_deviations(values: &[NotNan<f64>], center: f64) -> Vec<NotNan<f64>> {
    sorted_valid(values.iter().map(|v| (v.into_inner() - center).abs()))
}

impl ValidRow {
    /// 过滤掉 `row` 中的 `NaN`.
    pub fn new(row: ArrayView1<f64>) -> Self {
        Self::from_sorted(sorted_valid(row.iter().copied()))
    }

    fn from_sorted(sorted: Vec<NotNan<f64>>) -> Self {
        // 平坦行直接取该值, 避免求和的舍入误差使各偏差不为 0.
        let mean = match (sorted.first(), sorted.last()) {
            (Some(lo), Some(hi)) if lo == hi => lo.into_inner(),
            _ => mean_of(&sorted),
        };
        Self { sorted, mean }
    }

    /// 是否为平坦行: 非空且全部有效值相等.
    #[inline]
    fn is_flat(&self) -> bool {
        matches!((self.sorted.first(), self.sorted.last()), (Some(lo), Some(hi)) if lo == hi)
    }

    /// 有效值个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    #[inline]
    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.sorted.iter().map(|v| v.into_inner())
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// `moment` 阶中心矩. 一阶中心矩按定义恒为 0, 平坦行的各阶中心矩均为 0.
    pub fn moment(&self, moment: i32) -> f64 {
        if moment == 1 || self.is_flat() {
            return 0.0;
        }
        self.values().map(|v| (v - self.mean).powi(moment)).sum::<f64>() / self.len() as f64
    }

    /// 总体标准差 (分母为有效值个数).
    #[inline]
    pub fn std(&self) -> f64 {
        self.moment(2).sqrt()
    }

    #[inline]
    pub fn variance(&self) -> f64 {
        self.std().powi(2)
    }

    #[inline]
    pub fn skewness(&self) -> f64 {
        flat_region_ratio(self.moment(3), self.moment(2), 1.5)
    }

    #[inline]
    pub fn kurtosis(&self) -> f64 {
        flat_region_ratio(self.moment(4), self.moment(2), 2.0)
    }

    #[inline]
    pub fn percentile(&self, q: f64) -> f64 {
        percentile_sorted(&self.sorted, q)
    }

    #[inline]
    pub fn median(&self) -> f64 {
        self.percentile(P50)
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.sorted.first().map_or(f64::NAN, |v| v.into_inner())
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.sorted.last().map_or(f64::NAN, |v| v.into_inner())
    }

    #[inline]
    pub fn interquartile_range(&self) -> f64 {
        self.percentile(P75) - self.percentile(P25)
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.max() - self.min()
    }

    /// 与均值之差的绝对值的平均.
    #[inline]
    pub fn mean_absolute_deviation(&self) -> f64 {
        self.values().map(|v| (v - self.mean).abs()).sum::<f64>() / self.len() as f64
    }

    /// 只保留闭区间 `[P10, P90]` 内的值, 再以这部分值 **自身的均值** 为中心计算平均绝对偏差.
    pub fn robust_mean_absolute_deviation(&self) -> f64 {
        let (lo, hi) = (self.percentile(P10), self.percentile(P90));
        let kept: Vec<NotNan<f64>> = self
            .sorted
            .iter()
            .copied()
            .filter(|v| (lo..=hi).contains(&v.into_inner()))
            .collect();
        Self::from_sorted(kept).mean_absolute_deviation()
    }

    /// 与中位数之差的绝对值的中位数.
    pub fn median_absolute_deviation(&self) -> f64 {
        let dev = abs_deviations(&self.sorted, self.median());
        percentile_sorted(&dev, P50)
    }

    /// 标准差 / 均值. 无定义时为 0.
    #[inline]
    pub fn coefficient_of_variation(&self) -> f64 {
        safe_divide(self.std(), self.mean, 0.0)
    }

    /// `(P75 - P25) / (P75 + P25)`. 无定义时为 0.
    #[inline]
    pub fn quartile_coefficient_of_dispersion(&self) -> f64 {
        let (q25, q75) = (self.percentile(P25), self.percentile(P75));
        safe_divide(q75 - q25, q75 + q25, 0.0)
    }

    /// `sum((v + shift)^2)`. 为空时为 0.
    #[inline]
    pub fn energy(&self, shift: f64) -> f64 {
        self.values().map(|v| (v + shift).powi(2)).sum()
    }

    /// `sqrt(energy / n)`. 为空时为 `NaN`; 整个样本矩阵为空的情况由调用方处理.
    #[inline]
    pub fn root_mean_squared(&self, shift: f64) -> f64 {
        (self.energy(shift) / self.len() as f64).sqrt()
    }

    /// 计算单个特征.
    pub fn eval(&self, feature: FirstOrderFeature, shift: f64) -> f64 {
        use FirstOrderFeature::*;
        match feature {
            Mean => self.mean(),
            Variance => self.variance(),
            Skewness => self.skewness(),
            Kurtosis => self.kurtosis(),
            Median => self.median(),
            Minimum => self.min(),
            Percentile10 => self.percentile(P10),
            Percentile90 => self.percentile(P90),
            Maximum => self.max(),
            InterquartileRange => self.interquartile_range(),
            Range => self.range(),
            MeanAbsoluteDeviation => self.mean_absolute_deviation(),
            RobustMeanAbsoluteDeviation => self.robust_mean_absolute_deviation(),
            MedianAbsoluteDeviation => self.median_absolute_deviation(),
            CoefficientOfVariation => self.coefficient_of_variation(),
            QuartileCoefficientOfDispersion => self.quartile_coefficient_of_dispersion(),
            Energy => self.energy(shift),
            RootMeanSquared => self.root_mean_squared(shift),
            StandardDeviation => self.std(),
        }
    }
}
