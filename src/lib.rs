//! # Doc Batch Convert
//!
//! 批量调用外部文档引擎（Pandoc、无头 Chromium、WeasyPrint 或任意命令行工具），
//! 把一个目录中的源文档逐个转换为 PDF / DOCX / HTML，并生成汇总报告。
//! 本身不做任何排版或格式编解码。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（子进程、浏览器实例），只暴露能力
//! - `ToolCommand` - 运行外部工具，超时丢弃即终止子进程
//! - `BrowserSession` - 每个任务独占的无头浏览器
//!
//! ### ② 引擎层（Converters）
//! - `converters/` - 把一个 `Job` 翻译成一次外部调用
//! - `Converter` trait + `Engine` 枚举，由配置显式构建
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个任务或单次汇总
//! - `enumerator` - 目录 → 有序任务
//! - `ConverterInvoker` - 超时、输出校验、残留清理
//! - `ResultAggregator` / `ReportWriter` - 汇总与落盘
//! - `merge` - 文章合并
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 并发、截止时间、生命周期、统计
//!
//! ## 模块结构

pub mod cli;
pub mod config;
pub mod converters;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use converters::{Converter, Engine};
pub use error::{AppError, AppResult, ConfigError, ConvertError};
pub use models::{BatchReport, ConversionResult, EngineKind, FailureKind, Job, JobStatus, OutputFormat};
pub use orchestrator::{App, BatchProcessor};
pub use services::ConverterInvoker;
