//! 批量转换处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是批量转换的入口，负责并发调度和资源生命周期。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、按配置构建转换引擎
//! 2. **任务枚举**：扫描源目录得到有序的 `Vec<Job>`
//! 3. **依赖预检**：引擎不可用时所有任务直接判为依赖缺失
//! 4. **并发控制**：Semaphore 限制同时运行的外部调用数量
//! 5. **截止时间**：超过批处理截止时间的任务不再调度
//! 6. **全局统计**：汇总结果、写报告、决定退出码
//!
//! ## 设计特点
//!
//! - **顶层编排**：不关心单个任务怎么转换
//! - **按完成顺序收集**：`FuturesUnordered` 逐个取回结果，报告再恢复枚举顺序
//! - **任务隔离**：单个任务的错误、超时甚至 panic 都只影响它自己的结果

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::converters::{Converter, Engine};
use crate::models::{BatchReport, ConversionResult, FailureKind, Job};
use crate::services::report_writer::TEXT_REPORT_NAME;
use crate::services::{enumerate_jobs, ConverterInvoker, ReportWriter, ResultAggregator};
use crate::utils::logging::{self, log_jobs_loaded, log_startup, print_final_stats};

/// 批量处理器
///
/// 持有调用器（共享给所有任务）和并发参数。
pub struct BatchProcessor<C> {
    invoker: Arc<ConverterInvoker<C>>,
    concurrency: usize,
    deadline: Option<Duration>,
}

impl<C: Converter> BatchProcessor<C> {
    pub fn new(invoker: ConverterInvoker<C>, concurrency: usize) -> Self {
        Self {
            invoker: Arc::new(invoker),
            concurrency: concurrency.max(1),
            deadline: None,
        }
    }

    /// 设置整个批处理的截止时间
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// 处理所有任务
    ///
    /// 每个任务恰好产生一个结果，无论成功、失败、超时还是未被调度。
    pub async fn run(&self, jobs: Vec<Job>) -> BatchReport {
        let started_at = logging::timestamp();
        let deadline_at = self.deadline.map(|d| Instant::now() + d);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut aggregator = ResultAggregator::new(jobs.len());

        let mut pending = FuturesUnordered::new();
        for job in jobs {
            let job = Arc::new(job);
            let invoker = Arc::clone(&self.invoker);
            let semaphore = Arc::clone(&semaphore);
            let task_job = Arc::clone(&job);

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return ConversionResult::cancelled(&task_job),
                };

                if deadline_at.is_some_and(|at| Instant::now() >= at) {
                    warn!("{} ⏰ 批处理截止时间已到，跳过", task_job);
                    return ConversionResult::cancelled(&task_job);
                }

                invoker.invoke(&task_job).await
            });

            pending.push(async move { (job, handle.await) });
        }

        while let Some((job, joined)) = pending.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("{} 任务执行失败: {}", job, e);
                    ConversionResult::failed(
                        &job,
                        FailureKind::ConversionFailed,
                        format!("任务异常终止: {}", e),
                        Duration::ZERO,
                    )
                }
            };
            aggregator.record(result);
            info!("📈 进度: {}", aggregator.progress());
        }

        aggregator.finalize(self.invoker.converter().name(), started_at)
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    engine: Engine,
}

impl App {
    /// 初始化应用
    ///
    /// 配置错误在创建任何任务之前返回。
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置无效")?;
        let engine = Engine::from_config(&config).context("无法创建转换引擎")?;

        log_startup(engine.name(), config.concurrency);

        Ok(Self { config, engine })
    }

    /// 运行一次批量转换
    ///
    /// 源目录不存在等致命错误返回 `Err`；单个任务的失败体现在报告里。
    pub async fn run(self) -> Result<BatchReport> {
        info!("\n📁 正在扫描待转换的文档...");
        let jobs = enumerate_jobs(&self.config).await?;

        if jobs.is_empty() {
            warn!("⚠️ 没有找到匹配 .{} 的文件", self.config.extension.trim_start_matches('.'));
        } else {
            log_jobs_loaded(jobs.len(), self.config.concurrency);
        }

        let mut invoker = ConverterInvoker::new(Arc::new(self.engine), self.config.timeout());
        if !jobs.is_empty() {
            invoker.preflight().await;
        }

        let report = BatchProcessor::new(invoker, self.config.concurrency)
            .with_deadline(self.config.deadline())
            .run(jobs)
            .await;

        let writer = ReportWriter::with_paths(
            self.config.output_dir()?.join(TEXT_REPORT_NAME),
            self.config.report_path()?,
        );
        writer.write(&report).await.context("无法保存转换报告")?;

        print_final_stats(&report, &writer.json_path().display().to_string());
        Ok(report)
    }
}
