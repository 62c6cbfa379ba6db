//! 在合成体数据上端到端地测试整体模式与逐体素模式.

use ct_firstorder::kernel::KernelOffsets;
use ct_firstorder::prelude::*;
use log::LevelFilter;
use ndarray::{Array3, ArrayView1};
use simple_logger::SimpleLogger;

use FirstOrderFeature as F;

fn init_logger() {
    // 同一个测试进程中只能初始化一次.
    let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();
}

fn float_eq(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

/// 强度体数据, 掩膜, 离散化体数据及灰度级集合.
struct Phantom {
    image: Array3<f64>,
    mask: Array3<bool>,
    disc: Array3<u32>,
    levels: Vec<u32>,
}

impl Phantom {
    fn new(image: Array3<f64>, mask: Array3<bool>, bins: u32) -> Self {
        let disc = image.mapv(|v| (v.max(0.0) as u32) % bins);
        Self {
            image,
            mask,
            disc,
            levels: (0..bins).collect(),
        }
    }

    fn input(&self) -> RoiInput<f64> {
        RoiInput::new(
            self.image.view(),
            self.mask.view(),
            self.disc.view(),
            &self.levels,
        )
        .unwrap()
    }

    fn extractor(&self, settings: Settings) -> FirstOrderExtractor {
        FirstOrderExtractor::new(&self.input(), settings).unwrap()
    }
}

/// 一条直线上的体数据, 全部在 ROI 内.
fn line(values: &[f64]) -> Phantom {
    let image = Array3::from_shape_vec((1, 1, values.len()), values.to_vec()).unwrap();
    let mask = Array3::from_elem(image.dim(), true);
    Phantom::new(image, mask, 3)
}

/// `n^3` 的体数据, ROI 为去掉最外层后的立方体. 强度取值不规则.
fn shelled_cube(n: usize) -> Phantom {
    let image = Array3::from_shape_fn((n, n, n), |(z, h, w)| {
        ((z * 7 + h * 3 + w * 5) % 11) as f64 * 1.5 + (z * h + w) as f64
    });
    let mask = Array3::from_shape_fn((n, n, n), |(z, h, w)| {
        [z, h, w].iter().all(|&i| i > 0 && i + 1 < n)
    });
    Phantom::new(image, mask, 4)
}

#[test]
fn test_aggregate_scenario() {
    init_logger();
    let p = line(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
    let v = p.extractor(Settings::new()).aggregate().unwrap();
    assert_eq!(v.len(), FirstOrderFeature::ALL.len());

    let get = |f| v.get(f).unwrap();
    assert!(float_eq(get(F::Mean), 115.0 / 6.0));
    assert!(float_eq(get(F::Median), 3.5));
    assert_eq!(get(F::Minimum), 1.0);
    assert_eq!(get(F::Maximum), 100.0);
    assert_eq!(get(F::Range), 99.0);
    assert!(float_eq(get(F::Percentile10), 1.5));
    assert!(float_eq(get(F::Percentile90), 52.5));
    assert!(float_eq(get(F::InterquartileRange), 2.5));
    // 总体方差.
    assert!(float_eq(get(F::Variance), 10055.0 / 6.0 - (115.0f64 / 6.0).powi(2)));
    assert!(float_eq(get(F::Variance), get(F::StandardDeviation).powi(2)));
    assert_eq!(get(F::Energy), 10055.0);
    assert!(float_eq(get(F::RootMeanSquared), (10055.0f64 / 6.0).sqrt()));
    // 10%~90% 之间为 [2, 3, 4, 5], 其均值为 3.5.
    assert!(float_eq(get(F::RobustMeanAbsoluteDeviation), 1.0));
    assert!(float_eq(get(F::MedianAbsoluteDeviation), 1.5));
    assert!(get(F::RobustMeanAbsoluteDeviation) <= get(F::MeanAbsoluteDeviation));

    // 离散化为 [1, 2, 0, 1, 2, 1].
    let o = v.occupancy();
    assert_eq!(o.rows(), 1);
    assert_eq!(o.totals().to_vec(), vec![6.0]);
    let p = o.probabilities();
    assert!(float_eq(p[(0, 0)], 1.0 / 6.0));
    assert!(float_eq(p[(0, 1)], 3.0 / 6.0));
    assert!(float_eq(p[(0, 2)], 2.0 / 6.0));
}

#[test]
fn test_energy_shift() {
    let p = line(&[-3.0, -1.0, 2.0]);
    for shift in [-10.0, 0.0, 2.5, 100.0] {
        let v = p
            .extractor(Settings::new().with_voxel_array_shift(shift))
            .aggregate()
            .unwrap();
        let expected: f64 = [-3.0f64, -1.0, 2.0].iter().map(|x| (x + shift).powi(2)).sum();
        assert!(v.get(F::Energy).unwrap() >= 0.0);
        assert!(float_eq(v.get(F::Energy).unwrap(), expected));
        assert!(float_eq(v.get(F::RootMeanSquared).unwrap(), (expected / 3.0).sqrt()));
        // 偏移量不影响其他特征.
        assert!(float_eq(v.get(F::Mean).unwrap(), -2.0 / 3.0));
    }
}

#[test]
fn test_flat_region() {
    // 0.1, 1.1 等值求和存在舍入误差, 仍然必须视为平坦区域.
    for c in [7.0, 0.1, 1.1, 123.45] {
        let p = line(&[c; 5]);
        let ex = p.extractor(Settings::new().with_kernel_radius(2));

        let aggregate = ex.aggregate().unwrap();
        let local = ex.voxel_map(&[(0, 0, 2)]).unwrap();
        for f in [
            F::Skewness,
            F::Kurtosis,
            F::CoefficientOfVariation,
            F::QuartileCoefficientOfDispersion,
            F::Range,
            F::InterquartileRange,
            F::Variance,
        ] {
            assert_eq!(aggregate.get(f), Some(0.0), "{c}: {f}");
            assert_eq!(local.get(f).unwrap()[0], 0.0, "{c}: {f}");
        }
        assert_eq!(aggregate.get(F::Mean), Some(c));
        assert_eq!(aggregate.get(F::Median), Some(c));
        assert_eq!(local.get(F::Mean).unwrap()[0], c);
    }
}

#[test]
fn test_round_trip_full_cover() {
    init_logger();
    // ROI 为 3x3x3, 半径 1 时中心体素的邻域恰好覆盖整个 ROI.
    let p = shelled_cube(5);
    let ex = p.extractor(Settings::new());
    assert_eq!(ex.offsets().len(), 27);

    let aggregate = ex.aggregate().unwrap();
    let local = ex.voxel_map(&[(2, 2, 2)]).unwrap();
    for (f, v) in aggregate.iter() {
        assert!(float_eq(v, local.get(f).unwrap()[0]), "{f}: {v}");
    }
    let (a, b) = (aggregate.occupancy(), local.occupancy());
    for (x, y) in a.probabilities().iter().zip(b.probabilities().iter()) {
        assert!(float_eq(*x, *y));
    }
    assert_eq!(a.totals().to_vec(), b.totals().to_vec());
}

#[test]
fn test_round_trip_corner_with_large_radius() {
    // ROI 为 [1, 5)^3, 半径 3 时角落体素 (1, 1, 1) 的邻域覆盖整个 ROI 以及部分 ROI 外的体素.
    let p = shelled_cube(6);
    let ex = p.extractor(Settings::new().with_kernel_radius(3));
    assert_eq!(ex.offsets().extent(), 3);

    let aggregate = ex.aggregate().unwrap();
    let local = ex.voxel_map(&[(1, 1, 1)]).unwrap();
    for (f, v) in aggregate.iter() {
        assert!(float_eq(v, local.get(f).unwrap()[0]), "{f}: {v}");
    }
    assert_eq!(
        aggregate.occupancy().totals().to_vec(),
        local.occupancy().totals().to_vec()
    );
}

#[test]
fn test_custom_offsets_cover_bounding_box() {
    // 单向的偏移量表同样足以覆盖整个 ROI.
    let p = shelled_cube(6);
    let input = p.input();
    let offsets = KernelOffsets::custom(itertools::iproduct!(0..4isize, 0..4isize, 0..4isize));
    assert_eq!(offsets.len(), 64);
    let ex = FirstOrderExtractor::with_offsets(
        &input,
        Settings::new().with_kernel_radius(3),
        offsets,
    )
    .unwrap();

    let aggregate = ex.aggregate().unwrap();
    let local = ex.voxel_map(&[(1, 1, 1)]).unwrap();
    for (f, v) in aggregate.iter() {
        assert!(float_eq(v, local.get(f).unwrap()[0]), "{f}: {v}");
    }
}

#[test]
fn test_offsets_exceed_padding() {
    let p = shelled_cube(5);
    let offsets = KernelOffsets::custom([(0, 0, 2), (0, 0, -1)]);
    let e = FirstOrderExtractor::with_offsets(&p.input(), Settings::new(), offsets);
    assert!(matches!(e, Err(FeatureError::KernelExceedsPadding { .. })));
}

fn row_eq(a: ArrayView1<f64>, b: ArrayView1<f64>) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| float_eq(*x, *y))
}

#[test]
fn test_empty_row_does_not_affect_others() {
    init_logger();
    // 只有前 3 个体素在 ROI 内. (0, 0, 5) 的邻域全部在 ROI 外.
    let image = Array3::from_shape_vec((1, 1, 7), vec![4.0, 8.0, 15.0, 16.0, 23.0, 42.0, 7.0]).unwrap();
    let mask = Array3::from_shape_fn((1, 1, 7), |(_, _, w)| w < 3);
    let p = Phantom::new(image, mask, 5);
    let coords = [(0, 0, 0), (0, 0, 5), (0, 0, 1)];

    for settings in [Settings::new(), Settings::new().with_voxel_batch(1)] {
        let ex = p.extractor(settings);
        let maps = ex.voxel_map(&coords).unwrap();
        assert_eq!(maps.len(), 3);

        let alone_0 = ex.voxel_map(&coords[..1]).unwrap();
        let alone_2 = ex.voxel_map(&coords[2..]).unwrap();
        assert!(row_eq(maps.values().row(0), alone_0.values().row(0)));
        assert!(row_eq(maps.values().row(2), alone_2.values().row(0)));

        assert!(maps.get(F::Mean).unwrap()[1].is_nan());
        assert!(maps.get(F::Maximum).unwrap()[1].is_nan());
        assert_eq!(maps.get(F::Energy).unwrap()[1], 0.0);
        assert_eq!(maps.get(F::CoefficientOfVariation).unwrap()[1], 0.0);
        assert_eq!(maps.occupancy().totals()[1], 0.0);
        assert!(maps.occupancy().probabilities().row(1).iter().all(|&x| x == 0.0));

        assert_eq!(maps.get(F::Mean).unwrap()[0], 6.0);
        assert_eq!(maps.get(F::Mean).unwrap()[2], 9.0);
    }
}

#[test]
fn test_empty_roi() {
    let image = Array3::from_elem((2, 2, 2), 1.0);
    let mask = Array3::from_elem((2, 2, 2), false);
    let p = Phantom::new(image, mask, 2);
    let ex = p.extractor(Settings::new());
    // 只剩下中心.
    assert_eq!(ex.offsets().len(), 1);

    let v = ex.aggregate().unwrap();
    assert!(v.get(F::Mean).unwrap().is_nan());
    assert!(v.get(F::Median).unwrap().is_nan());
    assert_eq!(v.get(F::RootMeanSquared), Some(0.0));
    assert_eq!(v.get(F::Energy), Some(0.0));

    let maps = ex.voxel_map_roi().unwrap();
    assert!(maps.is_empty());
    assert_eq!(maps.values().dim(), (0, FirstOrderFeature::ALL.len()));
}

#[test]
fn test_force_2d() {
    let image = Array3::from_shape_fn((3, 3, 3), |(z, h, w)| (z * 9 + h * 3 + w) as f64);
    let mask = Array3::from_elem((3, 3, 3), true);
    let p = Phantom::new(image, mask, 3);
    let ex = p.extractor(Settings::new().with_force_2d(0));
    assert_eq!(ex.offsets().len(), 9);
    assert!(ex.offsets().iter().all(|(dz, _, _)| dz == 0));

    let maps = ex.voxel_map(&[(1, 1, 1)]).unwrap();
    assert_eq!(maps.get(F::Mean).unwrap()[0], 13.0);
    assert_eq!(maps.get(F::Minimum).unwrap()[0], 9.0);
    assert_eq!(maps.get(F::Maximum).unwrap()[0], 17.0);
}

#[test]
fn test_unmasked_kernel() {
    let p = {
        let image = Array3::from_shape_vec((1, 1, 5), vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let mask = Array3::from_shape_fn((1, 1, 5), |(_, _, w)| w == 2);
        Phantom::new(image, mask, 5)
    };

    let masked = p.extractor(Settings::new());
    assert_eq!(masked.offsets().len(), 1);
    let m = masked.voxel_map_roi().unwrap();
    assert_eq!(m.coords(), &[(0, 0, 2)]);
    assert_eq!(m.get(F::Mean).unwrap()[0], 3.0);
    assert_eq!(m.get(F::Maximum).unwrap()[0], 3.0);

    let unmasked = p.extractor(Settings::new().with_masked_kernel(false));
    assert_eq!(unmasked.offsets().len(), 3);
    let u = unmasked.voxel_map_roi().unwrap();
    assert_eq!(u.get(F::Mean).unwrap()[0], 3.0);
    assert_eq!(u.get(F::Maximum).unwrap()[0], 4.0);
    assert_eq!(u.occupancy().totals()[0], 3.0);
    // 整体模式仍然只使用 ROI 内的体素.
    let v = unmasked.aggregate().unwrap();
    assert_eq!(v.get(F::Maximum), Some(3.0));
}

#[test]
fn test_voxel_map_roi_to_volume() {
    let p = shelled_cube(5);
    let ex = p.extractor(Settings::new().with_voxel_batch(5));
    let maps = ex.voxel_map_roi().unwrap();
    assert_eq!(maps.len(), 27);
    assert_eq!(maps.coords()[0], (1, 1, 1));
    assert_eq!(maps.coords()[26], (3, 3, 3));

    let vol = maps.to_volume(F::Mean).unwrap();
    assert_eq!(vol.dim(), (5, 5, 5));
    for ((z, h, w), v) in vol.indexed_iter() {
        assert_eq!(p.mask[(z, h, w)], !v.is_nan());
    }
    // 每个邻域都包含中心, 因此最小值不大于中心强度.
    let min = maps.to_volume(F::Minimum).unwrap();
    for &(z, h, w) in maps.coords() {
        assert!(min[(z, h, w)] <= p.image[(z, h, w)]);
    }
}

#[test]
fn test_structural_errors() {
    let p = shelled_cube(4);

    let short = Array3::<bool>::from_elem((4, 4, 3), true);
    let e = RoiInput::new(p.image.view(), short.view(), p.disc.view(), &p.levels);
    assert!(matches!(e, Err(FeatureError::ShapeMismatch { what: "mask", .. })));

    let e = FirstOrderExtractor::new(&p.input(), Settings::new().with_kernel_radius(0));
    assert!(matches!(e, Err(FeatureError::InvalidKernelRadius(0))));

    let e = FirstOrderExtractor::new(&p.input(), Settings::new().with_force_2d(3));
    assert!(matches!(e, Err(FeatureError::InvalidForce2dDimension(3))));

    let ex = p.extractor(Settings::new());
    let e = ex.voxel_map(&[(1, 1, 1), (0, 4, 0)]);
    assert_eq!(
        e,
        Err(FeatureError::CoordinateOutOfBound {
            index: 1,
            coord: (0, 4, 0),
            shape: (4, 4, 4),
        })
    );
}

#[test]
fn test_feature_selection_by_name() {
    let p = line(&[1.0, 2.0, 3.0, 4.0]);
    let mut enabled = FeatureSet::none();
    enabled.enable_by_name("10Percentile").unwrap();
    enabled.enable_by_name("Energy").unwrap();
    assert!(matches!(
        enabled.enable_by_name("Entropy"),
        Err(FeatureError::UnknownFeature(_))
    ));

    let v = p.extractor(Settings::new().with_features(enabled)).aggregate().unwrap();
    let names: Vec<String> = v.iter().map(|(f, _)| f.to_string()).collect();
    assert_eq!(names, vec!["10Percentile", "Energy"]);
    assert_eq!(v.get(F::Energy), Some(30.0));
}
