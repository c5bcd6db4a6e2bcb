//! 批处理报告

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::models::result::{ConversionResult, JobStatus};

/// 一次批处理的汇总
///
/// `succeeded + failed + timed_out` 恒等于 `total`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub engine: String,
    pub started_at: String,
    pub finished_at: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    /// 按枚举顺序排列
    pub results: Vec<ConversionResult>,
}

impl BatchReport {
    /// 由（已按枚举顺序排列的）结果构造报告
    pub fn new(
        engine: impl Into<String>,
        started_at: impl Into<String>,
        finished_at: impl Into<String>,
        results: Vec<ConversionResult>,
    ) -> Self {
        let count = |status: JobStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            engine: engine.into(),
            started_at: started_at.into(),
            finished_at: finished_at.into(),
            total: results.len(),
            succeeded: count(JobStatus::Succeeded),
            failed: count(JobStatus::Failed),
            timed_out: count(JobStatus::TimedOut),
            results,
        }
    }

    /// 所有失败与超时的任务
    pub fn failures(&self) -> Vec<&ConversionResult> {
        self.results.iter().filter(|r| !r.is_success()).collect()
    }

    /// 是否全部成功
    pub fn is_success(&self) -> bool {
        self.succeeded == self.total
    }

    /// 进程退出码：全部成功为 0，否则为 1
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "批量转换报告 ({})", self.engine)?;
        writeln!(f, "开始时间: {}", self.started_at)?;
        writeln!(f, "完成时间: {}", self.finished_at)?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "任务总数: {}", self.total)?;
        writeln!(f, "成功: {}", self.succeeded)?;
        writeln!(f, "失败: {}", self.failed)?;
        writeln!(f, "超时: {}", self.timed_out)?;

        let failures = self.failures();
        if !failures.is_empty() {
            writeln!(f, "{}", "─".repeat(60))?;
            writeln!(f, "失败任务 ({}):", failures.len())?;
            for result in failures {
                match &result.error {
                    Some(error) => writeln!(
                        f,
                        "  • {} [{}] {}",
                        result.file_name(),
                        error.kind.label(),
                        error.message
                    )?,
                    None => writeln!(f, "  • {}", result.file_name())?,
                }
            }
        }

        let outputs: Vec<_> = self.results.iter().filter_map(|r| r.output.as_ref()).collect();
        if !outputs.is_empty() {
            writeln!(f, "{}", "─".repeat(60))?;
            writeln!(f, "生成的文件:")?;
            for output in outputs {
                writeln!(f, "  → {}", output.display())?;
            }
        }

        write!(f, "{}", "=".repeat(60))
    }
}
