//! 结果汇总服务
//!
//! 由批处理驱动独占，按到达顺序收集结果，结束时恢复枚举顺序。

use crate::models::{BatchReport, ConversionResult};
use crate::utils::logging::timestamp;

#[derive(Debug, Default)]
pub struct ResultAggregator {
    expected: usize,
    results: Vec<ConversionResult>,
}

impl ResultAggregator {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            results: Vec::with_capacity(expected),
        }
    }

    pub fn record(&mut self, result: ConversionResult) {
        self.results.push(result);
    }

    /// 当前进度描述，例如 `3/10`
    pub fn progress(&self) -> String {
        format!("{}/{}", self.results.len(), self.expected)
    }

    /// 所有未成功的结果（到达顺序）
    pub fn failures(&self) -> Vec<&ConversionResult> {
        self.results.iter().filter(|r| !r.is_success()).collect()
    }

    /// 生成报告，结果按枚举顺序排列
    pub fn finalize(mut self, engine: &str, started_at: String) -> BatchReport {
        self.results.sort_by_key(|r| r.job_index);
        BatchReport::new(engine, started_at, timestamp(), self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversionOptions, EngineKind, FailureKind, Job, OutputFormat};
    use std::time::Duration;

    fn job(index: usize, name: &str) -> Job {
        Job::new(
            index,
            format!("docs/{}", name),
            format!("out/{}.pdf", name),
            EngineKind::Pandoc,
            OutputFormat::Pdf,
            ConversionOptions::default(),
        )
    }

    #[test]
    fn test_finalize_restores_order_and_counts() {
        let mut aggregator = ResultAggregator::new(4);
        aggregator.record(ConversionResult::timed_out(
            &job(3, "d.md"),
            Duration::from_secs(1),
            Duration::from_secs(1),
        ));
        aggregator.record(ConversionResult::succeeded(&job(1, "b.md"), Duration::ZERO));
        aggregator.record(ConversionResult::failed(
            &job(2, "c.md"),
            FailureKind::ConversionFailed,
            "bad",
            Duration::ZERO,
        ));
        aggregator.record(ConversionResult::succeeded(&job(0, "a.md"), Duration::ZERO));

        assert_eq!(aggregator.progress(), "4/4");
        assert_eq!(aggregator.failures().len(), 2);

        let report = aggregator.finalize("pandoc", timestamp());
        let order: Vec<_> = report.results.iter().map(|r| r.job_index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.timed_out, 1);
        assert_eq!(report.succeeded + report.failed + report.timed_out, report.total);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_empty_batch_is_success() {
        let report = ResultAggregator::new(0).finalize("pandoc", timestamp());
        assert_eq!(report.total, 0);
        assert_eq!(report.exit_code(), 0);
    }
}
