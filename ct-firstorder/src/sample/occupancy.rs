//! 灰度级占有率.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::ENTROPY_EPSILON;

/// 每个评估点上, 各灰度级的体素个数及其归一化分布.
///
/// 行数等于评估点个数, 列数等于灰度级个数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Occupancy {
    /// 归一化后的分布. 每行之和为 1, 或 (总数为 0 时) 全为 0.
    p: Array2<f64>,

    /// 归一化前每行的总数.
    totals: Array1<f64>,
}

impl Occupancy {
    /// 由计数矩阵构建.
    ///
    /// 总数为 0 的行按照总数为 1 进行归一化, 因此得到全 0 分布而不是 `NaN`.
    pub fn from_counts(counts: Array2<f64>) -> Self {
        let totals = counts.sum_axis(Axis(1));
        let guarded = totals.mapv(|t| if t == 0.0 { 1.0 } else { t });
        let p = counts / &guarded.insert_axis(Axis(1));
        Self { p, totals }
    }

    /// `rows` 个评估点, `levels` 个灰度级的全 0 占有率.
    pub(crate) fn zeros(rows: usize, levels: usize) -> Self {
        Self {
            p: Array2::zeros((rows, levels)),
            totals: Array1::zeros(rows),
        }
    }

    /// 将 `other` 的全部行写入从 `start` 开始的行.
    pub(crate) fn assign_rows(&mut self, start: usize, other: &Occupancy) {
        let end = start + other.rows();
        self.p.slice_mut(s![start..end, ..]).assign(&other.p);
        self.totals.slice_mut(s![start..end]).assign(&other.totals);
    }

    /// 评估点个数.
    #[inline]
    pub fn rows(&self) -> usize {
        self.p.nrows()
    }

    /// 灰度级个数.
    #[inline]
    pub fn levels(&self) -> usize {
        self.p.ncols()
    }

    /// 归一化后的分布.
    #[inline]
    pub fn probabilities(&self) -> ArrayView2<'_, f64> {
        self.p.view()
    }

    /// 归一化前每行的总数, 即落在某一灰度级内的有效体素个数.
    #[inline]
    pub fn totals(&self) -> ArrayView1<'_, f64> {
        self.totals.view()
    }

    /// 每个评估点的熵 `-sum(p * log2(p + eps))`.
    pub fn entropy(&self) -> Array1<f64> {
        self.p.map_axis(Axis(1), |row| {
            -row.iter()
                .map(|p| p * (p + ENTROPY_EPSILON).log2())
                .sum::<f64>()
        })
    }

    /// 每个评估点的均匀度 `sum(p^2)`.
    pub fn uniformity(&self) -> Array1<f64> {
        self.p.map_axis(Axis(1), |row| row.iter().map(|p| p * p).sum())
    }
}
