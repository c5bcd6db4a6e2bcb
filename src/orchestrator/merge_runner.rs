//! 文章合并流程
//!
//! 把合并服务接到 pandoc 引擎上：预检、合并、转换、输出统计。

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::Config;
use crate::converters::PandocConverter;
use crate::models::ConversionResult;
use crate::services::{merge_articles, ConverterInvoker, MergeRequest};

/// 执行一次文章合并
///
/// 目录不存在或没有文章时返回 `Err`，转换失败体现在返回的结果中。
pub async fn run_merge(config: &Config, request: &MergeRequest) -> Result<ConversionResult> {
    info!("{}", "=".repeat(60));
    info!("🚀 开始合并文章: {}", request.articles_dir.display());
    info!("{}", "=".repeat(60));

    let converter = PandocConverter::for_format(request.format, request.options.pdf_engine.as_deref());
    let mut invoker = ConverterInvoker::new(Arc::new(converter), config.timeout());
    invoker.preflight().await;

    let result = merge_articles(&invoker, request)
        .await
        .context("文章合并失败")?;

    match &result.error {
        None => {
            info!("🎉 合并完成: {}", request.output.display());
            if let Ok(meta) = tokio::fs::metadata(&request.output).await {
                info!("   大小: {:.1} KB", meta.len() as f64 / 1024.0);
            }
        }
        Some(failure) => error!("❌ 合并失败 [{}]: {}", failure.kind.label(), failure.message),
    }

    Ok(result)
}
