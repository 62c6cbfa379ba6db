//! 逐体素模式下的 kernel 邻域偏移量.
//!
//! 偏移量表按照字典序 (`z` 优先) 生成, 与体数据的轴顺序一致,
//! 因此 `padded_center + offset` 可以直接用作 padding 后体数据的索引.

use itertools::Itertools;
use ndarray::ArrayView3;

use crate::consts::NDIM;
use crate::{FeatureError, FeatureResult, Idx3d, Offset3d};

/// 体素自身对应的零偏移.
pub const CENTER: Offset3d = (0, 0, 0);

/// 偏移量的切比雪夫距离 (各分量绝对值的最大值).
#[inline]
pub fn chebyshev((z, h, w): Offset3d) -> usize {
    z.unsigned_abs().max(h.unsigned_abs()).max(w.unsigned_abs())
}

/// `Offset3d` -> `[isize; 3]`
#[inline]
const fn offset_to_array((z, h, w): Offset3d) -> [isize; NDIM] {
    [z, h, w]
}

/// 生成邻域偏移量.
///
/// 对于每个候选偏移量 `a`, 当且仅当满足以下全部条件时被保留:
///
/// 1. 对每一维 `i`, `|a_i| <= size_i - 1`. 因此若某一维的 `size_i` 为 0,
///   则不会有任何偏移量被保留;
/// 2. 若指定了 `force_2d_dimension`, 则该维分量为 0;
/// 3. 切比雪夫距离 `max_i |a_i|` 恰好在 `distances` 中.
///
/// 零偏移的距离为 0, 因此只有当 `distances` 包含 0 时才会出现在结果中.
///
/// 若 `bidirectional` 为 `false`, 则只保留前一半结果:
/// 结果集合关于取负是对称的, 所以前一半中不存在互为相反数的一对.
///
/// # 返回值
///
/// 按字典序排列的、互不相同的偏移量.
pub fn generate_offsets(
    size: Idx3d,
    distances: &[usize],
    bidirectional: bool,
    force_2d_dimension: Option<usize>,
) -> Vec<Offset3d> {
    let Some(&max_distance) = distances.iter().max() else {
        return vec![];
    };
    let max_distance = max_distance as isize;
    let size = [size.0, size.1, size.2];
    let span = -max_distance..=max_distance;

    let accept = |offset: Offset3d| -> bool {
        let within = offset_to_array(offset)
            .iter()
            .zip(size.iter())
            .enumerate()
            .all(|(dim, (&a, &s))| {
                if force_2d_dimension == Some(dim) && a != 0 {
                    return false;
                }
                a.unsigned_abs() < s
            });
        within && distances.contains(&chebyshev(offset))
    };

    let mut offsets: Vec<Offset3d> = span
        .clone()
        .cartesian_product(span.clone())
        .cartesian_product(span)
        .map(|((z, h), w)| (z, h, w))
        .filter(|o| accept(*o))
        .collect();

    if !bidirectional {
        offsets.truncate(offsets.len() / 2);
    }
    offsets
}

/// 计算 kernel 的包围盒大小.
///
/// 若 `masked` 为 `true`, 则以 ROI 的范围 (每一维最大坐标 - 最小坐标 + 1) 为准;
/// ROI 为空时返回 `(0, 0, 0)`. 否则以整个体数据的形状为准.
/// 最终每一维都不会超过 kernel 直径 `2 * radius + 1`.
pub fn bounding_box_size(mask: ArrayView3<bool>, radius: usize, masked: bool) -> Idx3d {
    let diameter = radius * 2 + 1;
    let (z, h, w) = if masked {
        roi_extent(mask)
    } else {
        mask.dim()
    };
    (z.min(diameter), h.min(diameter), w.min(diameter))
}

/// ROI 在每一维上的跨度. ROI 为空时返回 `(0, 0, 0)`.
fn roi_extent(mask: ArrayView3<bool>) -> Idx3d {
    let mut lo = [usize::MAX; NDIM];
    let mut hi = [0usize; NDIM];
    let mut any = false;
    for ((z, h, w), _) in mask.indexed_iter().filter(|(_, m)| **m) {
        any = true;
        for (dim, v) in [z, h, w].into_iter().enumerate() {
            lo[dim] = lo[dim].min(v);
            hi[dim] = hi[dim].max(v);
        }
    }
    if !any {
        return (0, 0, 0);
    }
    (hi[0] - lo[0] + 1, hi[1] - lo[1] + 1, hi[2] - lo[2] + 1)
}

/// 逐体素模式共享的邻域偏移量表, 一次计算中保持不变.
///
/// 表中偏移量互不相同, 且 [`CENTER`] 恰好出现一次 (在最后).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelOffsets {
    offsets: Vec<Offset3d>,
}

impl KernelOffsets {
    /// 根据包围盒大小和 kernel 半径构建对称的邻域偏移量表.
    ///
    /// 距离取遍 `1..=radius`, 最后追加体素自身.
    pub fn build(bounding_size: Idx3d, radius: usize, force_2d_dimension: Option<usize>) -> Self {
        let distances: Vec<usize> = (1..=radius).collect();
        let mut offsets = generate_offsets(bounding_size, &distances, true, force_2d_dimension);
        offsets.push(CENTER);
        log::trace!("kernel offsets: {offsets:?}");
        Self { offsets }
    }

    /// 使用外部提供的偏移量表. 重复的偏移量会被去除 (保留第一次出现的位置),
    /// 零偏移会被移到最后; 若不存在零偏移, 则会追加.
    pub fn custom<I: IntoIterator<Item = Offset3d>>(offsets: I) -> Self {
        let mut offsets: Vec<Offset3d> = offsets
            .into_iter()
            .filter(|o| *o != CENTER)
            .unique()
            .collect();
        offsets.push(CENTER);
        Self { offsets }
    }

    /// 偏移量个数 (包括体素自身).
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// 恒为 `false`: 偏移量表至少包含体素自身.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// 获取能迭代全部偏移量的迭代器.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Offset3d> + '_ {
        self.offsets.iter().copied()
    }

    /// 以切片形式获取全部偏移量.
    #[inline]
    pub fn as_slice(&self) -> &[Offset3d] {
        &self.offsets
    }

    /// 偏移量分量绝对值的最大值, 即邻域查找所需的最小 padding 宽度.
    #[inline]
    pub fn extent(&self) -> usize {
        self.iter().map(chebyshev).max().unwrap_or(0)
    }

    /// 检查 padding 宽度 `radius` 是否足以容纳全部偏移量.
    pub fn check_padding(&self, radius: usize) -> FeatureResult<()> {
        let extent = self.extent();
        if extent > radius {
            return Err(FeatureError::KernelExceedsPadding { extent, radius });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_full_3d_radius_1() {
        let o = generate_offsets((3, 3, 3), &[1], true, None);
        assert_eq!(o.len(), 26);
        assert_eq!(o[0], (-1, -1, -1));
        assert_eq!(o[25], (1, 1, 1));
        assert!(!o.contains(&CENTER));
        assert!(o.iter().all_unique());
    }

    #[test]
    fn test_radius_2() {
        let o = generate_offsets((5, 5, 5), &[1, 2], true, None);
        assert_eq!(o.len(), 124);
        let o = generate_offsets((5, 5, 5), &[2], true, None);
        assert_eq!(o.len(), 124 - 26);
        assert!(o.iter().all(|p| chebyshev(*p) == 2));
    }

    #[test]
    fn test_bounded_by_size() {
        // 只有一层, z 分量必须为 0.
        let o = generate_offsets((1, 3, 3), &[1], true, None);
        assert_eq!(o.len(), 8);
        assert!(o.iter().all(|p| p.0 == 0));

        // 半径 2, 但 w 方向仅两个体素宽.
        let o = generate_offsets((5, 5, 2), &[1, 2], true, None);
        assert!(o.iter().all(|p| p.2.abs() <= 1));
        assert_eq!(o.len(), 5 * 5 * 3 - 1);
    }

    #[test]
    fn test_zero_size_is_empty() {
        assert!(generate_offsets((0, 3, 3), &[1], true, None).is_empty());
        assert!(generate_offsets((3, 3, 3), &[], true, None).is_empty());

        let k = KernelOffsets::build((0, 0, 0), 2, None);
        assert_eq!(k.as_slice(), &[CENTER]);
        assert_eq!(k.extent(), 0);
    }

    #[test]
    fn test_force_2d() {
        let o = generate_offsets((3, 3, 3), &[1], true, Some(0));
        assert_eq!(o.len(), 8);
        assert!(o.iter().all(|p| p.0 == 0));

        let o = generate_offsets((3, 3, 3), &[1], true, Some(2));
        assert_eq!(o.len(), 8);
        assert!(o.iter().all(|p| p.2 == 0));
    }

    #[test]
    fn test_unidirectional_half() {
        let o = generate_offsets((3, 3, 3), &[1], false, None);
        assert_eq!(o.len(), 13);
        for p in o.iter() {
            assert!(!o.contains(&(-p.0, -p.1, -p.2)));
        }
    }

    #[test]
    fn test_kernel_offsets_build() {
        let k = KernelOffsets::build((3, 3, 3), 1, None);
        assert_eq!(k.len(), 27);
        assert_eq!(*k.as_slice().last().unwrap(), CENTER);
        assert_eq!(k.iter().filter(|o| *o == CENTER).count(), 1);
        assert_eq!(k.extent(), 1);
        assert!(k.check_padding(1).is_ok());
    }

    #[test]
    fn test_kernel_offsets_custom() {
        let k = KernelOffsets::custom([(0, 0, 1), (0, 0, 0), (0, 0, 1), (0, -2, 0)]);
        assert_eq!(k.as_slice(), &[(0, 0, 1), (0, -2, 0), CENTER]);
        assert_eq!(k.extent(), 2);
        assert_eq!(
            k.check_padding(1),
            Err(FeatureError::KernelExceedsPadding {
                extent: 2,
                radius: 1
            })
        );
    }

    #[test]
    fn test_bounding_box_size() {
        let mut mask = Array3::from_elem((10, 10, 10), false);
        assert_eq!(bounding_box_size(mask.view(), 1, true), (0, 0, 0));
        assert_eq!(bounding_box_size(mask.view(), 1, false), (3, 3, 3));

        mask[(2, 3, 4)] = true;
        assert_eq!(bounding_box_size(mask.view(), 1, true), (1, 1, 1));

        mask[(3, 3, 8)] = true;
        assert_eq!(bounding_box_size(mask.view(), 1, true), (2, 1, 3));
        assert_eq!(bounding_box_size(mask.view(), 3, true), (2, 1, 5));
    }
}
