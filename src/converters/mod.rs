//! 转换引擎层
//!
//! 每个引擎把一个 `Job` 翻译成一次外部调用。引擎本身不处理超时、
//! 清理和结果统计，这些由 `services::invoker` 统一负责。

pub mod chromium;
pub mod command;
pub mod pandoc;
pub mod weasyprint;

use std::future::Future;

pub use chromium::ChromiumConverter;
pub use command::CommandConverter;
pub use pandoc::PandocConverter;
pub use weasyprint::WeasyPrintConverter;

use crate::config::Config;
use crate::error::{ConfigError, ConvertError};
use crate::models::{EngineKind, Job};

/// 转换器能力
///
/// 实现者只需要"把源文件变成输出文件"，成功时输出文件必须已经写好。
pub trait Converter: Send + Sync + 'static {
    /// 引擎名称（用于日志和报告）
    fn name(&self) -> &str;

    /// 预检外部依赖是否可用
    fn probe(&self) -> impl Future<Output = Result<(), ConvertError>> + Send;

    /// 执行一次转换
    fn convert(&self, job: &Job) -> impl Future<Output = Result<(), ConvertError>> + Send;
}

/// 由配置构建的具体引擎
///
/// 显式构建、向下传递，不存在全局的"当前引擎"。
#[derive(Debug, Clone)]
pub enum Engine {
    Pandoc(PandocConverter),
    Chromium(ChromiumConverter),
    Weasyprint(WeasyPrintConverter),
    Command(CommandConverter),
}

impl Engine {
    /// 按配置中的引擎类型构建
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::build(config.engine, config)
    }

    /// 构建指定类型的引擎
    pub fn build(kind: EngineKind, config: &Config) -> Result<Self, ConfigError> {
        let engine = match kind {
            EngineKind::Pandoc => {
                Engine::Pandoc(PandocConverter::for_format(config.format, config.options.pdf_engine.as_deref()))
            }
            EngineKind::Chromium => Engine::Chromium(ChromiumConverter::new(config.chromium.clone())),
            EngineKind::Weasyprint => Engine::Weasyprint(WeasyPrintConverter::new()),
            EngineKind::Command => {
                let settings = config
                    .command
                    .clone()
                    .ok_or(ConfigError::Missing { field: "[command]" })?;
                Engine::Command(CommandConverter::new(settings))
            }
        };
        Ok(engine)
    }
}

impl Converter for Engine {
    fn name(&self) -> &str {
        match self {
            Engine::Pandoc(c) => c.name(),
            Engine::Chromium(c) => c.name(),
            Engine::Weasyprint(c) => c.name(),
            Engine::Command(c) => c.name(),
        }
    }

    async fn probe(&self) -> Result<(), ConvertError> {
        match self {
            Engine::Pandoc(c) => c.probe().await,
            Engine::Chromium(c) => c.probe().await,
            Engine::Weasyprint(c) => c.probe().await,
            Engine::Command(c) => c.probe().await,
        }
    }

    async fn convert(&self, job: &Job) -> Result<(), ConvertError> {
        match self {
            Engine::Pandoc(c) => c.convert(job).await,
            Engine::Chromium(c) => c.convert(job).await,
            Engine::Weasyprint(c) => c.convert(job).await,
            Engine::Command(c) => c.convert(job).await,
        }
    }
}
