//! 转换调用服务 - 业务能力层
//!
//! 只负责"执行一个任务并给出结果"，不关心批量和并发。
//! 任何错误都在这里被收敛为 `ConversionResult`，不会向上传播。

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::converters::Converter;
use crate::error::ConvertError;
use crate::infrastructure::remove_partial_output;
use crate::models::{ConversionResult, FailureKind, Job};

/// 默认单任务超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// 转换调用器
///
/// 职责：
/// - 检查源文件、准备输出目录
/// - 在超时内调用引擎，超时即丢弃 future（子进程随之终止）
/// - 校验输出文件；引擎运行后失败时，只清理本次写出的残留
pub struct ConverterInvoker<C> {
    converter: Arc<C>,
    timeout: Duration,
    /// 预检失败时记录的原因，之后的任务直接判为依赖缺失
    unavailable: Option<String>,
}

impl<C: Converter> ConverterInvoker<C> {
    pub fn new(converter: Arc<C>, timeout: Duration) -> Self {
        Self {
            converter,
            timeout,
            unavailable: None,
        }
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// 标记引擎不可用
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        self.unavailable = Some(reason.into());
    }

    /// 预检引擎依赖，失败时标记为不可用
    ///
    /// # 返回
    /// 依赖是否可用
    pub async fn preflight(&mut self) -> bool {
        info!("🔍 正在检查 {} 的外部依赖...", self.converter.name());
        match self.converter.probe().await {
            Ok(()) => true,
            Err(e) => {
                error!("❌ {}", e);
                warn!("⚠️ 所有任务将被标记为依赖缺失，不会调用外部工具");
                self.mark_unavailable(e.to_string());
                false
            }
        }
    }

    /// 执行单个任务
    pub async fn invoke(&self, job: &Job) -> ConversionResult {
        let started = Instant::now();
        debug!("{} ▶️ 开始转换 ({})", job, job.engine());

        let result = self.run(job, started).await;

        if result.is_success() {
            info!("{} ✅ 完成 ({} ms)", job, result.elapsed_ms);
        } else if let Some(failure) = &result.error {
            warn!("{} ❌ {}: {}", job, failure.kind.label(), failure.message);
        }

        result
    }

    async fn run(&self, job: &Job, started: Instant) -> ConversionResult {
        if !is_file(job.source()).await {
            let error = ConvertError::SourceNotFound {
                path: job.source().to_path_buf(),
            };
            return ConversionResult::from_error(job, &error, started.elapsed());
        }

        if let Some(reason) = &self.unavailable {
            return ConversionResult::failed(
                job,
                FailureKind::MissingDependency,
                reason.clone(),
                started.elapsed(),
            );
        }

        if let Some(parent) = job.output().parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent).await {
                let error = ConvertError::io(format!("无法创建输出目录 {}", parent.display()), e);
                return ConversionResult::from_error(job, &error, started.elapsed());
            }
        }

        let before = OutputState::read(job.output()).await;

        let result = match tokio::time::timeout(self.timeout, self.converter.convert(job)).await {
            Err(_) => ConversionResult::timed_out(job, self.timeout, started.elapsed()),
            Ok(Err(error)) => ConversionResult::from_error(job, &error, started.elapsed()),
            Ok(Ok(())) => match validate_output(job.output()).await {
                Ok(()) => ConversionResult::succeeded(job, started.elapsed()),
                Err(error) => ConversionResult::from_error(job, &error, started.elapsed()),
            },
        };

        // 引擎没有动过的文件（例如上一次成功的输出）保持原样
        if !result.is_success() && OutputState::read(job.output()).await != before {
            remove_partial_output(job.output()).await;
        }

        result
    }
}

/// 输出文件在某一时刻的状态，用于判断引擎是否写过它
#[derive(Debug, Clone, PartialEq)]
struct OutputState {
    len: u64,
    modified: Option<SystemTime>,
}

impl OutputState {
    async fn read(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).await.ok()?;
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

/// 引擎声称成功时，输出文件必须存在且非空
async fn validate_output(path: &Path) -> Result<(), ConvertError> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(ConvertError::EmptyOutput {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::CommandSettings;
    use crate::converters::CommandConverter;
    use crate::models::{ConversionOptions, EngineKind, JobStatus, OutputFormat};
    use tempfile::TempDir;

    fn shell(script: &str) -> Arc<CommandConverter> {
        Arc::new(CommandConverter::new(CommandSettings {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            probe_args: vec!["-c".to_string(), "echo sh".to_string()],
        }))
    }

    fn job(dir: &TempDir, name: &str) -> Job {
        let stem = Path::new(name).file_stem().unwrap().to_string_lossy().to_string();
        Job::new(
            0,
            dir.path().join(name),
            dir.path().join("out").join(format!("{}.pdf", stem)),
            EngineKind::Command,
            OutputFormat::Pdf,
            ConversionOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_success_creates_output_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();

        let invoker = ConverterInvoker::new(shell("cp \"{input}\" \"{output}\""), DEFAULT_TIMEOUT);
        let result = invoker.invoke(&job(&dir, "a.md")).await;

        assert_eq!(result.status, JobStatus::Succeeded);
        assert_eq!(std::fs::read_to_string(dir.path().join("out/a.pdf")).unwrap(), "# A");
    }

    #[tokio::test]
    async fn test_missing_source_skips_engine() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("called");
        let invoker = ConverterInvoker::new(
            shell(&format!("touch \"{}\"", marker.display())),
            DEFAULT_TIMEOUT,
        );

        let result = invoker.invoke(&job(&dir, "ghost.md")).await;

        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.error.unwrap().kind, FailureKind::SourceNotFound);
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_engine_failure_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.md"), "x").unwrap();

        let invoker = ConverterInvoker::new(
            shell("echo partial > \"{output}\"; echo 'bad table' >&2; exit 2"),
            DEFAULT_TIMEOUT,
        );
        let result = invoker.invoke(&job(&dir, "broken.md")).await;

        let failure = result.error.unwrap();
        assert_eq!(failure.kind, FailureKind::ConversionFailed);
        assert!(failure.message.contains("bad table"));
        assert!(!dir.path().join("out/broken.pdf").exists());
    }

    #[tokio::test]
    async fn test_empty_output_is_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "x").unwrap();

        let invoker = ConverterInvoker::new(shell("touch \"{output}\""), DEFAULT_TIMEOUT);
        let result = invoker.invoke(&job(&dir, "a.md")).await;

        assert_eq!(result.error.unwrap().kind, FailureKind::EmptyOutput);
        assert!(!dir.path().join("out/a.pdf").exists());
    }

    #[tokio::test]
    async fn test_timeout_kills_subprocess() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("slow.md"), "x").unwrap();
        let marker = dir.path().join("finished");

        let invoker = ConverterInvoker::new(
            shell(&format!("sleep 2; touch \"{}\"", marker.display())),
            Duration::from_millis(200),
        );
        let started = Instant::now();
        let result = invoker.invoke(&job(&dir, "slow.md")).await;

        assert_eq!(result.status, JobStatus::TimedOut);
        assert_eq!(result.error.unwrap().kind, FailureKind::Timeout);
        assert!(started.elapsed() < Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("slow.md"), "x").unwrap();
        let marker = dir.path().join("grandchild");

        let invoker = ConverterInvoker::new(
            shell(&format!("(sleep 1; touch \"{}\"); true", marker.display())),
            Duration::from_millis(200),
        );
        let result = invoker.invoke(&job(&dir, "slow.md")).await;
        assert_eq!(result.status, JobStatus::TimedOut);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_failure_keeps_untouched_previous_output() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "x").unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        std::fs::write(dir.path().join("out/a.pdf"), "previous run").unwrap();

        let invoker = ConverterInvoker::new(shell("echo 'no fonts' >&2; exit 1"), DEFAULT_TIMEOUT);
        let result = invoker.invoke(&job(&dir, "a.md")).await;

        assert_eq!(result.error.unwrap().kind, FailureKind::ConversionFailed);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/a.pdf")).unwrap(),
            "previous run"
        );
    }

    #[tokio::test]
    async fn test_unavailable_engine_keeps_previous_output() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "x").unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        std::fs::write(dir.path().join("out/a.pdf"), "previous run").unwrap();

        let mut invoker = ConverterInvoker::new(shell("exit 0"), DEFAULT_TIMEOUT);
        invoker.mark_unavailable("pandoc 未安装");
        let result = invoker.invoke(&job(&dir, "a.md")).await;

        assert_eq!(result.error.unwrap().kind, FailureKind::MissingDependency);
        assert!(dir.path().join("out/a.pdf").exists());
    }

    #[tokio::test]
    async fn test_unavailable_engine() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "x").unwrap();

        let converter = Arc::new(CommandConverter::new(CommandSettings {
            program: "doc-batch-no-such-tool-7f3a".to_string(),
            args: vec![],
            probe_args: vec!["--version".to_string()],
        }));
        let mut invoker = ConverterInvoker::new(converter, DEFAULT_TIMEOUT);

        assert!(!invoker.preflight().await);
        let result = invoker.invoke(&job(&dir, "a.md")).await;
        assert_eq!(result.error.unwrap().kind, FailureKind::MissingDependency);
    }
}
