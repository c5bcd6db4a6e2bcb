//! 单个任务的转换结果

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::models::job::Job;

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    Failed,
    TimedOut,
}

/// 失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SourceNotFound,
    MissingDependency,
    ConversionFailed,
    EmptyOutput,
    Timeout,
    /// 批处理截止时间已过，任务未被调度
    Cancelled,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::SourceNotFound => "源文件不存在",
            FailureKind::MissingDependency => "缺少依赖",
            FailureKind::ConversionFailed => "转换失败",
            FailureKind::EmptyOutput => "输出为空",
            FailureKind::Timeout => "超时",
            FailureKind::Cancelled => "未调度",
        }
    }
}

/// 失败详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// 转换结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// 任务的枚举顺序
    pub job_index: usize,
    pub source: PathBuf,
    pub status: JobStatus,
    /// 成功时的输出路径
    pub output: Option<PathBuf>,
    /// 失败或超时时的原因
    pub error: Option<JobFailure>,
    pub elapsed_ms: u64,
}

impl ConversionResult {
    /// 成功
    pub fn succeeded(job: &Job, elapsed: Duration) -> Self {
        Self {
            job_index: job.index(),
            source: job.source().to_path_buf(),
            status: JobStatus::Succeeded,
            output: Some(job.output().to_path_buf()),
            error: None,
            elapsed_ms: millis(elapsed),
        }
    }

    /// 失败
    pub fn failed(job: &Job, kind: FailureKind, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            job_index: job.index(),
            source: job.source().to_path_buf(),
            status: JobStatus::Failed,
            output: None,
            error: Some(JobFailure {
                kind,
                message: message.into(),
            }),
            elapsed_ms: millis(elapsed),
        }
    }

    /// 由转换错误构造失败结果
    pub fn from_error(job: &Job, error: &ConvertError, elapsed: Duration) -> Self {
        Self::failed(job, error.kind(), error.to_string(), elapsed)
    }

    /// 单任务超时
    pub fn timed_out(job: &Job, budget: Duration, elapsed: Duration) -> Self {
        Self {
            job_index: job.index(),
            source: job.source().to_path_buf(),
            status: JobStatus::TimedOut,
            output: None,
            error: Some(JobFailure {
                kind: FailureKind::Timeout,
                message: format!("外部调用超过 {} 秒未完成，已终止", budget.as_secs_f64()),
            }),
            elapsed_ms: millis(elapsed),
        }
    }

    /// 批处理截止时间已过，任务没有被调度
    pub fn cancelled(job: &Job) -> Self {
        Self {
            job_index: job.index(),
            source: job.source().to_path_buf(),
            status: JobStatus::TimedOut,
            output: None,
            error: Some(JobFailure {
                kind: FailureKind::Cancelled,
                message: "批处理截止时间已到，任务未被调度".to_string(),
            }),
            elapsed_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Succeeded
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// 源文件名
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
