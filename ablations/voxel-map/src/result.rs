//! 实验结果.

use crate::profile::Profile;
use std::io::{self, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Profile `{name}`:")?;
    writeln!(w, "{S4}Kernel size: {}", p.get_kernel())?;
    writeln!(w, "{S4}Evaluated voxels: {}", p.get_points())?;
    writeln!(w, "{S4}Voxels with empty kernels: {}", p.get_empty())?;
    writeln!(w, "{S4}Timed tasks: {}", p.get_tasks())?;
    writeln!(w, "{S4}Effective total time: {} us", p.get_task_time_us())?;
    writeln!(
        w,
        "{S4}Effective average time: {} us per voxel",
        f64_to_display(p.get_avg_point_time_us())
    )?;
    writeln!(w, "{S4}Total machine time: {} us", p.get_real_time_us())?;
    match p.get_most_time_consuming() {
        Some(d) => write!(w, "{S4}Most time-consuming task costs {} us", d.as_micros()),
        None => write!(w, "{S4}Most time-consuming task costs /"),
    }
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(String, Profile)>,
}

impl FromIterator<(String, Profile)> for AblationResult {
    fn from_iter<I: IntoIterator<Item = (String, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }
}

impl AblationResult {
    /// 输出运行结果.
    pub fn analyze(&self) {
        let stdout = io::stdout();
        let mut w = stdout.lock();
        if let Err(e) = self.write_to(&mut w) {
            log::error!("Failed to write ablation result: {e}");
        }
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        utils::sep_to(&mut *w)?;
        for (key, profile) in self.data.iter() {
            describe_into(key, profile, w)?;
            writeln!(w)?;
            utils::sep_to(&mut *w)?;
        }
        Ok(())
    }
}
