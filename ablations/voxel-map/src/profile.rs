//! 实验运行统计.

use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时 (`self.start()`).
    #[inline]
    pub fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    pub fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// # 注意
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    pub fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 获得累计时间 (以微秒为单位).
    #[inline]
    pub fn get_total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

impl Default for AccTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// 一组实验 (固定 kernel 半径与线程数) 的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 每个评估体素的邻域大小 (偏移量个数).
    kernel: usize,

    /// 计算过的评估体素个数.
    points: u64,

    /// 邻域内没有任何有效体素的评估体素个数.
    empty: u64,

    /// 已计时的任务个数.
    tasks: u64,

    /// 特征计算花费的总时间.
    task_time: AccTimer,

    /// 整组实验花费的总时间 (包括构建提取器).
    real_time: AccTimer,

    /// 最耗时的一次任务.
    most: Option<Duration>,
}

impl Profile {
    /// 初始化, 同时开始整组实验计时.
    #[inline]
    pub fn new(kernel: usize) -> Self {
        Self {
            kernel,
            points: 0,
            empty: 0,
            tasks: 0,
            task_time: AccTimer::default(),
            real_time: AccTimer::default(),
            most: None,
        }
    }

    /// 记录 `points` 个评估体素, 其中 `empty` 个邻域为空.
    #[inline]
    pub fn count_points(&mut self, points: usize, empty: usize) {
        self.points += points as u64;
        self.empty += empty as u64;
    }

    /// 开始一次任务计时.
    #[inline]
    pub fn task_start(&mut self) {
        self.task_time.start();
    }

    /// 结束一次任务计时.
    #[inline]
    pub fn task_elapsed(&mut self) {
        let d = self.task_time.elapsed();
        self.tasks += 1;
        self.most = Some(self.most.map_or(d, |m| m.max(d)));
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 邻域大小.
    #[inline]
    pub fn get_kernel(&self) -> usize {
        self.kernel
    }

    /// 已计时的任务个数.
    #[inline]
    pub fn get_tasks(&self) -> u64 {
        self.tasks
    }

    /// 评估体素个数.
    #[inline]
    pub fn get_points(&self) -> u64 {
        self.points
    }

    /// 邻域为空的评估体素个数.
    #[inline]
    pub fn get_empty(&self) -> u64 {
        self.empty
    }

    /// 以微秒为单位获得全部任务的总时间.
    #[inline]
    pub fn get_task_time_us(&self) -> u64 {
        self.task_time.get_total_us()
    }

    /// 以微秒为单位获得整组实验的总时间.
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.get_total_us()
    }

    /// 每个评估体素的平均时间 (微秒).
    pub fn get_avg_point_time_us(&self) -> Option<f64> {
        match self.points {
            0 => None,
            points => Some(self.get_task_time_us() as f64 / points as f64),
        }
    }

    /// 最耗时的一次任务. 如果不存在任务, 则返回 `None`.
    #[inline]
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        self.most
    }
}
