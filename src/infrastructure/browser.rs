//! 无头浏览器会话 - 基础设施层
//!
//! 每个转换任务启动自己的浏览器实例（独立的用户数据目录），
//! 会话在任何退出路径上都会被释放：正常结束时显式关闭，
//! 超时或出错导致会话被丢弃时由 `Drop` 终止事件循环并清理目录。

use std::path::{Path, PathBuf};

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::ChromiumSettings;
use crate::error::ConvertError;

const ENGINE: &str = "chromium";

/// 构建浏览器配置
///
/// 未配置可执行文件时由 chromiumoxide 自动探测，探测失败视为依赖缺失。
fn browser_config(settings: &ChromiumSettings, profile_dir: Option<&Path>) -> Result<BrowserConfig, ConvertError> {
    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--disable-gpu",           // 无头模式下禁用 GPU
        "--no-sandbox",            // 容器内没有沙盒权限
        "--disable-dev-shm-usage", // 防止共享内存不足
    ]);

    if !settings.args.is_empty() {
        builder = builder.args(settings.args.iter().map(String::as_str));
    }

    if let Some(executable) = &settings.executable {
        if !executable.exists() {
            return Err(ConvertError::missing(
                executable.display().to_string(),
                "配置的浏览器可执行文件不存在",
            ));
        }
        builder = builder.chrome_executable(executable);
    }

    if let Some(dir) = profile_dir {
        builder = builder.user_data_dir(dir);
    }

    builder.build().map_err(|e| ConvertError::missing(ENGINE, e))
}

/// 预检：确认能找到浏览器可执行文件
pub fn probe_browser(settings: &ChromiumSettings) -> Result<(), ConvertError> {
    browser_config(settings, None).map(|_| ())
}

/// 一个独占的浏览器实例
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl BrowserSession {
    /// 启动无头浏览器
    pub async fn launch(settings: &ChromiumSettings, profile_dir: PathBuf) -> Result<Self, ConvertError> {
        debug!("🚀 启动无头浏览器，用户数据目录: {}", profile_dir.display());

        tokio::fs::create_dir_all(&profile_dir)
            .await
            .map_err(|e| ConvertError::io(format!("无法创建浏览器数据目录 {}", profile_dir.display()), e))?;

        let config = browser_config(settings, Some(&profile_dir))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动无头浏览器失败: {}", e);
            ConvertError::missing(ENGINE, format!("无法启动浏览器: {}", e))
        })?;

        // 在后台处理浏览器事件
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        debug!("无头浏览器启动成功");

        Ok(Self {
            browser,
            handler,
            profile_dir,
        })
    }

    /// 打开页面并等待加载完成
    pub async fn open(&self, url: &str) -> Result<Page, ConvertError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| ConvertError::failed(ENGINE, format!("打开页面 {} 失败: {}", url, e)))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| ConvertError::failed(ENGINE, format!("等待页面 {} 加载失败: {}", url, e)))?;

        debug!("页面加载完成: {}", url);
        Ok(page)
    }

    /// 关闭浏览器并等待进程退出
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("等待浏览器退出失败: {}", e);
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if let Err(e) = std::fs::remove_dir_all(&self.profile_dir) {
            debug!("清理浏览器数据目录失败 ({}): {}", self.profile_dir.display(), e);
        }
    }
}

/// 本地文件路径转为 file:// URL
///
/// 路径先规范化为绝对路径，`?`、`#`、`%`、空格等字符按 URL 规则转义。
pub fn file_url(path: &Path) -> Result<String, ConvertError> {
    let absolute = std::fs::canonicalize(path)
        .map_err(|e| ConvertError::io(format!("无法解析路径 {}", path.display()), e))?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| ConvertError::failed(ENGINE, format!("无法转换为 file URL: {}", absolute.display())))
}
