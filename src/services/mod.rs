//! 业务能力层（Services）
//!
//! 描述"我能做什么"：枚举任务、执行单个任务、汇总结果、写报告、合并文章。
//! 这里不管理并发，并发由编排层负责。

pub mod aggregator;
pub mod enumerator;
pub mod invoker;
pub mod merge;
pub mod report_writer;

pub use aggregator::ResultAggregator;
pub use enumerator::{enumerate_jobs, list_sources};
pub use invoker::ConverterInvoker;
pub use merge::{merge_articles, MergeRequest};
pub use report_writer::ReportWriter;
