use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::{ConversionOptions, EngineKind, OutputFormat};

/// 程序配置
///
/// 可以来自 TOML 文件，命令行参数再覆盖其中的值。
/// 源目录和输出目录必须显式给出，不做任何目录猜测。
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// 源文档目录
    pub source_dir: Option<PathBuf>,
    /// 输出目录
    pub output_dir: Option<PathBuf>,
    /// 源文件扩展名过滤（"md" 或 ".md"）
    pub extension: String,
    /// 使用的外部引擎
    pub engine: EngineKind,
    /// 输出格式
    pub format: OutputFormat,
    /// 同时运行的任务数量
    pub concurrency: usize,
    /// 单个任务的超时时间（秒）
    pub timeout_secs: u64,
    /// 整个批处理的截止时间（秒）
    pub deadline_secs: Option<u64>,
    /// JSON 报告路径，默认写到输出目录
    pub report_file: Option<PathBuf>,
    /// 是否显示详细日志
    pub verbose: bool,
    /// 所有任务共用的转换选项
    pub options: ConversionOptions,
    /// 按文件名覆盖的转换选项
    pub overrides: BTreeMap<String, ConversionOptions>,
    pub chromium: ChromiumSettings,
    pub command: Option<CommandSettings>,
}

/// 无头浏览器设置
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ChromiumSettings {
    /// 浏览器可执行文件，不填则自动探测
    pub executable: Option<PathBuf>,
    /// 追加的启动参数
    pub args: Vec<String>,
}

/// 自定义命令设置
///
/// `args` 中可以使用占位符 `{input}`、`{output}`、`{output_dir}`、`{stem}`。
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSettings {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// 预检参数，默认 `--version`
    #[serde(default = "default_probe_args")]
    pub probe_args: Vec<String>,
}

fn default_probe_args() -> Vec<String> {
    vec!["--version".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: None,
            output_dir: None,
            extension: "md".to_string(),
            engine: EngineKind::Pandoc,
            format: OutputFormat::Pdf,
            concurrency: default_concurrency(),
            timeout_secs: 120,
            deadline_secs: None,
            report_file: None,
            verbose: false,
            options: ConversionOptions::default(),
            overrides: BTreeMap::new(),
            chromium: ChromiumSettings::default(),
            command: None,
        }
    }
}

/// 默认并发数：CPU 核心数
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl Config {
    /// 从 TOML 文件加载配置
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// 解析 TOML 文本，`origin` 只用于错误信息
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// 有配置文件就加载，否则使用默认值
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn source_dir(&self) -> Result<&Path, ConfigError> {
        self.source_dir
            .as_deref()
            .ok_or(ConfigError::Missing { field: "source_dir" })
    }

    pub fn output_dir(&self) -> Result<&Path, ConfigError> {
        self.output_dir
            .as_deref()
            .ok_or(ConfigError::Missing { field: "output_dir" })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    /// 某个源文件最终使用的选项
    pub fn options_for(&self, file_name: &str) -> ConversionOptions {
        match self.overrides.get(file_name) {
            Some(over) => self.options.merged(over),
            None => self.options.clone(),
        }
    }

    /// JSON 报告路径
    pub fn report_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.report_file {
            Some(path) => Ok(path.clone()),
            None => Ok(self.output_dir()?.join("conversion_report.json")),
        }
    }

    /// 校验配置，在创建任何任务之前调用
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source_dir()?;
        self.output_dir()?;

        if self.concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "concurrency",
                reason: "至少为 1".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                reason: "至少为 1 秒".to_string(),
            });
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::Invalid {
                field: "extension",
                reason: "不能为空".to_string(),
            });
        }

        self.options.validate()?;
        for over in self.overrides.values() {
            self.options.merged(over).validate()?;
        }

        self.validate_engine()
    }

    /// 引擎与输出格式、引擎专属配置是否匹配
    pub fn validate_engine(&self) -> Result<(), ConfigError> {
        match self.engine {
            EngineKind::Chromium | EngineKind::Weasyprint if self.format != OutputFormat::Pdf => {
                Err(ConfigError::UnsupportedFormat {
                    engine: self.engine.to_string(),
                    format: self.format.to_string(),
                })
            }
            EngineKind::Command if self.command.is_none() => {
                Err(ConfigError::Missing { field: "[command]" })
            }
            _ => Ok(()),
        }
    }
}
