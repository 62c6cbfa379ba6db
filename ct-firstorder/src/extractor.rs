//! 特征提取入口.
//!
//! [`FirstOrderExtractor`] 是一次计算的只读上下文: padding 后的体数据,
//! 邻域偏移量表和配置在构建时确定, 之后不再修改. 每次请求都会重新采样,
//! 因此切换评估点集合 (整体 / 逐体素, 或者新的一批体素) 不会残留任何中间状态.

use log::{debug, warn};
use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3};
use num::ToPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::kernel::{bounding_box_size, KernelOffsets};
use crate::sample::{KernelWindow, Occupancy, SampleStrategy, Samples, WholeRegion};
use crate::stats::{self, FirstOrderFeature};
use crate::volume::{check_shape, PaddedRoi};
use crate::{FeatureError, FeatureResult, Idx3d, Settings};

/// 外部提供的输入: 强度体数据, ROI 掩膜, 离散化体数据及其灰度级集合.
///
/// 三个体数据的形状必须一致. 输入只会被读取, 不会被修改.
#[derive(Clone, Debug)]
pub struct RoiInput<'a, T> {
    image: ArrayView3<'a, T>,
    mask: ArrayView3<'a, bool>,
    discretized: ArrayView3<'a, u32>,
    gray_levels: Vec<u32>,
}

impl<'a, T> RoiInput<'a, T> {
    /// 组装输入. `gray_levels` 会被排序并去重.
    ///
    /// # 返回值
    ///
    /// 当 `mask` 或 `discretized` 与 `image` 形状不一致时返回
    /// `Err(FeatureError::ShapeMismatch)`.
    pub fn new(
        image: ArrayView3<'a, T>,
        mask: ArrayView3<'a, bool>,
        discretized: ArrayView3<'a, u32>,
        gray_levels: &[u32],
    ) -> FeatureResult<Self> {
        check_shape("mask", image.dim(), mask.dim())?;
        check_shape("discretized image", image.dim(), discretized.dim())?;
        let mut gray_levels = gray_levels.to_vec();
        gray_levels.sort_unstable();
        gray_levels.dedup();
        Ok(Self {
            image,
            mask,
            discretized,
            gray_levels,
        })
    }

    /// 体数据形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.image.dim()
    }

    /// 升序、无重复的灰度级集合.
    #[inline]
    pub fn gray_levels(&self) -> &[u32] {
        &self.gray_levels
    }

    /// ROI 掩膜.
    #[inline]
    pub fn mask(&self) -> ArrayView3<'a, bool> {
        self.mask
    }
}

/// 整体模式的结果: 每个启用的特征一个标量.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureVector {
    features: Vec<FirstOrderFeature>,
    values: Vec<f64>,
    occupancy: Occupancy,
}

impl FeatureVector {
    /// 获取 `feature` 的值. 未启用时返回 `None`.
    #[inline]
    pub fn get(&self, feature: FirstOrderFeature) -> Option<f64> {
        let i = self.features.iter().position(|f| *f == feature)?;
        Some(self.values[i])
    }

    /// 按 [`FirstOrderFeature::ALL`] 的顺序迭代 `(特征, 值)`.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (FirstOrderFeature, f64)> + '_ {
        self.features.iter().copied().zip(self.values.iter().copied())
    }

    /// 特征个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// 是否没有任何特征.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// ROI 的灰度级占有率 (一行).
    #[inline]
    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }
}

/// 逐体素模式的结果: 每个启用的特征一列, 每个评估体素一行.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureMaps {
    coords: Vec<Idx3d>,
    shape: Idx3d,
    features: Vec<FirstOrderFeature>,
    values: Array2<f64>,
    occupancy: Occupancy,
}

impl FeatureMaps {
    /// 评估体素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// 是否没有评估体素.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// 评估体素, 与结果的行一一对应.
    #[inline]
    pub fn coords(&self) -> &[Idx3d] {
        &self.coords
    }

    /// 启用的特征, 与结果的列一一对应.
    #[inline]
    pub fn features(&self) -> &[FirstOrderFeature] {
        &self.features
    }

    /// 全部结果, 形状为 `(评估体素个数, 特征个数)`.
    #[inline]
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// 获取 `feature` 在每个评估体素上的值. 未启用时返回 `None`.
    pub fn get(&self, feature: FirstOrderFeature) -> Option<ArrayView1<'_, f64>> {
        let i = self.features.iter().position(|f| *f == feature)?;
        Some(self.values.column(i))
    }

    /// 将 `feature` 的结果写回与原图像同形状的体数据, 未评估的位置为 `NaN`.
    pub fn to_volume(&self, feature: FirstOrderFeature) -> Option<Array3<f64>> {
        let column = self.get(feature)?;
        let mut volume = Array3::from_elem(self.shape, f64::NAN);
        for (&pos, &v) in self.coords.iter().zip(column.iter()) {
            volume[pos] = v;
        }
        Some(volume)
    }

    /// 每个评估体素的邻域灰度级占有率.
    #[inline]
    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }
}

/// 一阶特征提取器.
#[derive(Clone, Debug)]
pub struct FirstOrderExtractor {
    settings: Settings,
    roi: PaddedRoi,
    offsets: KernelOffsets,
    gray_levels: Vec<u32>,
}

impl FirstOrderExtractor {
    /// 校验配置, 构建 padding 后的体数据和对称的邻域偏移量表.
    ///
    /// kernel 的包围盒大小见 [`bounding_box_size`].
    pub fn new<T: ToPrimitive>(input: &RoiInput<T>, settings: Settings) -> FeatureResult<Self> {
        settings.validate()?;
        let radius = settings.kernel_radius() as usize;
        let size = bounding_box_size(input.mask, radius, settings.masked_kernel());
        debug!("kernel bounding box size: {size:?}");
        let offsets = KernelOffsets::build(size, radius, settings.force_2d_dimension());
        Self::with_offsets(input, settings, offsets)
    }

    /// 同 [`Self::new`], 但使用外部提供的偏移量表.
    ///
    /// 偏移量超出 kernel 半径时返回 `Err(FeatureError::KernelExceedsPadding)`.
    pub fn with_offsets<T: ToPrimitive>(
        input: &RoiInput<T>,
        settings: Settings,
        offsets: KernelOffsets,
    ) -> FeatureResult<Self> {
        settings.validate()?;
        let radius = settings.kernel_radius() as usize;
        offsets.check_padding(radius)?;

        let roi = PaddedRoi::new(
            input.image,
            input.mask,
            input.discretized,
            &input.gray_levels,
            radius,
            settings.masked_kernel(),
        )?;

        let roi_len = roi.roi_len();
        if roi_len == 0 {
            warn!("ROI is empty, first order features will degenerate");
        }
        debug!(
            "first order extractor initialized: shape {:?}, padding {}, {} kernel offsets, {} ROI voxels, {} gray levels",
            roi.shape(),
            radius,
            offsets.len(),
            roi_len,
            input.gray_levels.len()
        );

        Ok(Self {
            settings,
            roi,
            offsets,
            gray_levels: input.gray_levels.clone(),
        })
    }

    /// 配置.
    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 逐体素模式使用的偏移量表.
    #[inline]
    pub fn offsets(&self) -> &KernelOffsets {
        &self.offsets
    }

    /// padding 后的体数据.
    #[inline]
    pub fn padded_roi(&self) -> &PaddedRoi {
        &self.roi
    }

    /// 灰度级集合, 与占有率的列一一对应.
    #[inline]
    pub fn gray_levels(&self) -> &[u32] {
        &self.gray_levels
    }

    /// 启用的特征, 按 [`FirstOrderFeature::ALL`] 的顺序.
    #[inline]
    pub fn features(&self) -> Vec<FirstOrderFeature> {
        self.settings.enabled().iter().collect()
    }

    /// 按照 `strategy` 采样, 返回样本矩阵与灰度级占有率.
    #[inline]
    pub fn samples<S: SampleStrategy>(&self, strategy: &S) -> FeatureResult<Samples> {
        strategy.gather(&self.roi)
    }

    /// 按照 `strategy` 采样, 计算单个特征.
    ///
    /// 若 `feature` 未启用, 返回 `Err(FeatureError::DisabledFeature)`.
    pub fn feature<S: SampleStrategy>(
        &self,
        strategy: &S,
        feature: FirstOrderFeature,
    ) -> FeatureResult<Array1<f64>> {
        if !self.settings.enabled().contains(feature) {
            return Err(FeatureError::DisabledFeature(feature));
        }
        let samples = self.samples(strategy)?;
        Ok(stats::evaluate(
            &samples.matrix,
            feature,
            self.settings.voxel_array_shift(),
        ))
    }

    /// 按照 `strategy` 采样, 计算全部启用的特征.
    fn table<S: SampleStrategy>(
        &self,
        strategy: &S,
        features: &[FirstOrderFeature],
    ) -> FeatureResult<(Array2<f64>, Occupancy)> {
        let Samples { matrix, occupancy } = self.samples(strategy)?;
        let values = stats::evaluate_many(&matrix, features, self.settings.voxel_array_shift());
        Ok((values, occupancy))
    }

    /// 整体模式: 以 ROI 内全部体素为样本.
    pub fn aggregate(&self) -> FeatureResult<FeatureVector> {
        let features = self.features();
        let (values, occupancy) = self.table(&WholeRegion, &features)?;
        debug!("first order features computed over the whole ROI");
        Ok(FeatureVector {
            features,
            values: values.row(0).to_vec(),
            occupancy,
        })
    }

    /// 逐体素模式: 对 `coords` (原坐标系) 中的每个体素, 以其邻域为样本.
    ///
    /// 若配置了分批大小, 则分批采样与计算, 结果按原顺序拼接.
    /// 任何坐标越界都会使整个请求失败.
    pub fn voxel_map(&self, coords: &[Idx3d]) -> FeatureResult<FeatureMaps> {
        KernelWindow::new(coords, &self.offsets).validate(&self.roi)?;

        let features = self.features();
        let n = coords.len();
        let batch = self.settings.voxel_batch().unwrap_or(n).max(1);
        let mut values = Array2::<f64>::zeros((n, features.len()));
        let mut occupancy = Occupancy::zeros(n, self.roi.n_levels());

        for (i, chunk) in coords.chunks(batch).enumerate() {
            let start = i * batch;
            debug!(
                "voxel batch {i}: points {start}..{} of {n}",
                start + chunk.len()
            );
            let (v, o) = self.table(&KernelWindow::new(chunk, &self.offsets), &features)?;
            values
                .slice_mut(s![start..start + chunk.len(), ..])
                .assign(&v);
            occupancy.assign_rows(start, &o);
        }

        Ok(FeatureMaps {
            coords: coords.to_vec(),
            shape: self.roi.shape(),
            features,
            values,
            occupancy,
        })
    }

    /// 对 ROI 内每个体素 (行优先序) 运行逐体素模式.
    #[inline]
    pub fn voxel_map_roi(&self) -> FeatureResult<FeatureMaps> {
        self.voxel_map(&self.roi.roi_coords())
    }
}
