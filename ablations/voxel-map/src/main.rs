//! 逐体素一阶特征图的消融实验.
//!
//! 比较不同 kernel 半径下, 单线程与多线程计算整个 ROI 特征图的耗时.

mod profile;
mod result;
mod runner;

use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .expect("Logger initialization error");
    runner::run().analyze();
}
