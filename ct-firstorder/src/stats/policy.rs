//! 数值退化情况的处理规则.
//!
//! 平坦区域 (方差为 0) 和空样本都是合法的图像内容, 因此不会报错.
//! 每一条规则都是一个独立的函数, 以便单独测试.

use ordered_float::NotNan;

/// `a / b`. 当结果不是有限数 (`NaN`, `±inf`, 包括 `0 / 0` 和 `x / 0`) 时返回 `on_invalid`.
#[inline]
pub fn safe_divide(a: f64, b: f64, on_invalid: f64) -> f64 {
    finite_or(a / b, on_invalid)
}

/// `x` 是有限数时返回 `x`, 否则返回 `fallback`.
#[inline]
pub fn finite_or(x: f64, fallback: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        fallback
    }
}

/// 同 `finite_or(x, 0.0)`.
#[inline]
pub fn finite_or_zero(x: f64) -> f64 {
    finite_or(x, 0.0)
}

/// 标准化中心矩 `moment / m2^exponent`.
///
/// 若二阶中心矩 `m2` 为 0 (平坦区域), 分母视为 1, 且分子视为 0,
/// 因此结果恒为 0. `NaN` (空样本) 原样传播.
#[inline]
pub fn flat_region_ratio(moment: f64, m2: f64, exponent: f64) -> f64 {
    if m2 == 0.0 {
        return 0.0;
    }
    moment / m2.powf(exponent)
}

/// 升序数组 `sorted` 的第 `q` 百分位数 (`0 <= q <= 100`), 在相邻秩之间线性插值.
///
/// 数组为空时返回 `NaN`.
pub fn percentile_sorted(sorted: &[NotNan<f64>], q: f64) -> f64 {
    debug_assert!((0.0..=100.0).contains(&q));
    debug_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
    let Some(last) = sorted.len().checked_sub(1) else {
        return f64::NAN;
    };
    let h = last as f64 * q / 100.0;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = h - lo as f64;
    let (a, b) = (sorted[lo].into_inner(), sorted[hi].into_inner());
    if frac == 0.0 {
        a
    } else {
        a + (b - a) * frac
    }
}

/// 过滤掉 `NaN` 后升序排列.
pub fn sorted_valid<I: IntoIterator<Item = f64>>(values: I) -> Vec<NotNan<f64>> {
    let mut v: Vec<NotNan<f64>> = values
        .into_iter()
        .filter_map(|x| NotNan::new(x).ok())
        .collect();
    v.sort_unstable();
    v
}
