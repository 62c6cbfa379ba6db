//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use ct_firstorder::prelude::*;
use log::info;
use rayon::{ThreadPool, ThreadPoolBuilder};
use utils::phantom::Phantom;

/// phantom 形状.
const SHAPE: Idx3d = (24, 64, 64);

/// 灰度级个数.
const BINS: u32 = 16;

/// 参与比较的 kernel 半径.
const RADII: [u32; 3] = [1, 2, 3];

/// 每批评估体素个数.
const BATCH: usize = 4096;

/// 在 `pool` 中以半径 `radius` 计算整体特征与整个 ROI 的特征图.
fn measure(input: &RoiInput<f64>, radius: u32, pool: &ThreadPool) -> Profile {
    let settings = Settings::new()
        .with_kernel_radius(radius)
        .with_voxel_batch(BATCH);
    let ex = FirstOrderExtractor::new(input, settings).expect("Extractor initialization error");
    let mut profile = Profile::new(ex.offsets().len());

    pool.install(|| {
        profile.task_start();
        let aggregate = ex.aggregate().expect("Aggregate extraction error");
        profile.task_elapsed();
        for (f, v) in aggregate.iter() {
            info!("r = {radius}: {f} = {v:.4}");
        }

        profile.task_start();
        let maps = ex.voxel_map_roi().expect("Voxel map extraction error");
        profile.task_elapsed();

        let empty = maps
            .get(FirstOrderFeature::Mean)
            .map_or(0, |m| m.iter().filter(|v| v.is_nan()).count());
        profile.count_points(maps.len(), empty);
    });

    profile.finish()
}

/// 实际运行.
pub fn run() -> AblationResult {
    let phantom = Phantom::ellipsoid(SHAPE, BINS);
    let input = phantom.input().expect("Phantom input error");
    info!(
        "Phantom {:?} with {} ROI voxels, {} gray levels",
        phantom.shape(),
        phantom.roi_len(),
        BINS
    );

    let pools = [1, utils::cpus()].map(|n| {
        let pool = ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .expect("Thread pool building error");
        (n, pool)
    });

    println!("Running ablation studies...");
    RADII
        .into_iter()
        .flat_map(|r| pools.iter().map(move |(n, pool)| (r, *n, pool)))
        .map(|(r, n, pool)| {
            info!("Radius {r}, {n} thread(s)...");
            (format!("r={r}, threads={n}"), measure(&input, r, pool))
        })
        .collect()
}
