use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::FailureKind;

/// 应用程序错误类型
///
/// 只有这里的错误会中止整个批处理，单个任务的错误见 [`ConvertError`]。
#[derive(Debug, Error)]
pub enum AppError {
    /// 源目录不存在（枚举阶段，致命）
    #[error("目录不存在: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// 读取目录失败
    #[error("读取目录失败 ({}): {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 写入报告失败
    #[error("写入报告失败 ({}): {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 写入中间文件失败
    #[error("写入文件失败 ({}): {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 没有可合并的文章
    #[error("目录中没有可合并的文章: {}", path.display())]
    NothingToMerge { path: PathBuf },

    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// TOML 解析失败（包括未知字段）
    #[error("配置文件解析失败 ({}): {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// 缺少必填项
    #[error("缺少必填配置: {field}")]
    Missing { field: &'static str },

    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// 引擎不支持该输出格式
    #[error("引擎 {engine} 不支持输出格式 {format}")]
    UnsupportedFormat { engine: String, format: String },

    /// 输出文件就是源文件本身
    #[error("输出文件会覆盖源文件: {}", path.display())]
    OutputOverwritesSource { path: PathBuf },

    /// 多个源文件映射到同一个输出文件
    #[error("{} 和 {} 会写入同一个输出文件 {}", first.display(), second.display(), output.display())]
    DuplicateOutput {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },
}

/// 单个转换任务的错误
///
/// 由调用器在自身边界内转换为 `ConversionResult`，不会向上传播。
#[derive(Debug, Error)]
pub enum ConvertError {
    /// 源文件不存在
    #[error("源文件不存在: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// 外部工具缺失或无法启动
    #[error("外部工具不可用 ({tool}): {detail}")]
    MissingDependency { tool: String, detail: String },

    /// 外部引擎报错
    #[error("{engine} 转换失败: {message}")]
    Failed { engine: String, message: String },

    /// 引擎声称成功但没有产出文件
    #[error("输出文件缺失或为空: {}", path.display())]
    EmptyOutput { path: PathBuf },

    /// 本地文件操作失败
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl ConvertError {
    /// 创建引擎失败错误
    pub fn failed(engine: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Failed {
            engine: engine.into(),
            message: message.into(),
        }
    }

    /// 创建依赖缺失错误
    pub fn missing(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        ConvertError::MissingDependency {
            tool: tool.into(),
            detail: detail.into(),
        }
    }

    /// 创建 IO 错误
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        ConvertError::Io {
            context: context.into(),
            source,
        }
    }

    /// 对应到报告中的失败类别
    pub fn kind(&self) -> FailureKind {
        match self {
            ConvertError::SourceNotFound { .. } => FailureKind::SourceNotFound,
            ConvertError::MissingDependency { .. } => FailureKind::MissingDependency,
            ConvertError::Failed { .. } | ConvertError::Io { .. } => FailureKind::ConversionFailed,
            ConvertError::EmptyOutput { .. } => FailureKind::EmptyOutput,
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
