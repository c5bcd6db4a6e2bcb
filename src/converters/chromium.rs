//! 无头浏览器 PDF 导出
//!
//! HTML → PDF，使用浏览器自身的打印管线（页眉页脚、页码、背景色）。

use std::path::PathBuf;

use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use tracing::{debug, info};

use crate::config::ChromiumSettings;
use crate::converters::Converter;
use crate::error::ConvertError;
use crate::infrastructure::{file_url, probe_browser, BrowserSession};
use crate::models::{ConversionOptions, Job, PaperSize};

const ENGINE: &str = "chromium";

/// 浏览器打印转换器
#[derive(Debug, Clone)]
pub struct ChromiumConverter {
    settings: ChromiumSettings,
}

impl ChromiumConverter {
    pub fn new(settings: ChromiumSettings) -> Self {
        Self { settings }
    }

    /// 由转换选项生成打印参数
    pub fn print_params(options: &ConversionOptions) -> Result<PrintToPdfParams, ConvertError> {
        let (width, height) = options.paper.unwrap_or(PaperSize::A4).inches();
        let margin = options
            .margin_inches()
            .map_err(|e| ConvertError::failed(ENGINE, e.to_string()))?
            .unwrap_or(0.4);

        let has_header_footer = options.header_template.is_some() || options.footer_template.is_some();

        let mut builder = PrintToPdfParams::builder()
            .paper_width(width)
            .paper_height(height)
            .margin_top(margin)
            .margin_bottom(margin)
            .margin_left(margin)
            .margin_right(margin)
            .landscape(options.landscape.unwrap_or(false))
            .print_background(options.print_background.unwrap_or(true))
            .prefer_css_page_size(true)
            .display_header_footer(has_header_footer);

        if has_header_footer {
            // 只给出一个模板时，另一个用空元素，避免浏览器的默认页眉页脚
            builder = builder
                .header_template(options.header_template.clone().unwrap_or_else(|| "<span></span>".to_string()))
                .footer_template(options.footer_template.clone().unwrap_or_else(|| "<span></span>".to_string()));
        }

        Ok(builder.build())
    }

    /// 每个任务独占的浏览器数据目录
    fn profile_dir(job: &Job) -> PathBuf {
        std::env::temp_dir().join(format!(
            "doc_batch_convert-chromium-{}-{}",
            std::process::id(),
            job.index()
        ))
    }

    async fn print(session: &BrowserSession, job: &Job, params: PrintToPdfParams) -> Result<(), ConvertError> {
        let url = file_url(job.source())?;
        let page = session.open(&url).await?;

        info!("{} 📄 正在打印 PDF...", job);
        let pdf = page
            .pdf(params)
            .await
            .map_err(|e| ConvertError::failed(ENGINE, format!("打印 PDF 失败: {}", e)))?;

        tokio::fs::write(job.output(), &pdf)
            .await
            .map_err(|e| ConvertError::io(format!("写入 {} 失败", job.output().display()), e))?;

        debug!("{} 已写入 {} 字节", job, pdf.len());
        Ok(())
    }
}

impl Converter for ChromiumConverter {
    fn name(&self) -> &str {
        ENGINE
    }

    async fn probe(&self) -> Result<(), ConvertError> {
        probe_browser(&self.settings)?;
        info!("✓ 已找到浏览器可执行文件");
        Ok(())
    }

    async fn convert(&self, job: &Job) -> Result<(), ConvertError> {
        let params = Self::print_params(job.options())?;
        let session = BrowserSession::launch(&self.settings, Self::profile_dir(job)).await?;

        let outcome = Self::print(&session, job, params).await;
        session.close().await;
        outcome
    }
}
