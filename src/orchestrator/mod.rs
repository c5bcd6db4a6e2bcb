//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量转换处理器
//! - 管理应用生命周期（初始化、运行、写报告）
//! - 控制并发数量（Semaphore）与批处理截止时间
//! - 输出全局统计信息
//!
//! ### `merge_runner` - 文章合并流程
//! ### `check` - 外部依赖检查
//! ### `commands` - 子命令分发与退出码
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Job>)
//!     ↓
//! services (能力层：enumerate / invoke / aggregate / report / merge)
//!     ↓
//! converters (pandoc / chromium / weasyprint / command)
//!     ↓
//! infrastructure (基础设施：子进程、浏览器)
//! ```

pub mod batch_processor;
pub mod check;
pub mod commands;
pub mod merge_runner;

// 重新导出主要类型
pub use batch_processor::{App, BatchProcessor};
pub use check::{check_engines, EngineCheck};
pub use commands::{exit_code, run_command, EXIT_FATAL};
pub use merge_runner::run_merge;
