//! 命令行参数
//!
//! 命令行参数覆盖配置文件中的同名项。

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::error::ConfigError;
use crate::models::{EngineKind, OutputFormat};
use crate::services::merge::{self, MergeRequest};

#[derive(Parser, Debug)]
#[command(name = "doc_batch_convert")]
#[command(author, version, about = "批量调用外部引擎转换文档", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 批量转换目录中的文档
    Convert(ConvertArgs),
    /// 把按日期命名的 Markdown 文章合并为一份文档
    Merge(MergeArgs),
    /// 检查外部工具是否可用
    Check(CheckArgs),
}

/// 各子命令共用的参数
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// TOML 配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 单个任务的超时（秒）
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// 输出调试日志
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CommonArgs {
    /// 加载配置文件并应用公共覆盖项
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config.verbose |= self.verbose;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConvertArgs {
    /// 源文档目录
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// 输出目录
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 扩展名过滤（如 md、.html）
    #[arg(long)]
    pub ext: Option<String>,

    /// 转换引擎
    #[arg(short, long, value_enum)]
    pub engine: Option<EngineKind>,

    /// 输出格式
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// 最大并发数
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// 整个批处理的截止时间（秒）
    #[arg(long)]
    pub deadline: Option<u64>,

    /// JSON 报告路径
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ConvertArgs {
    /// 配置文件 + 命令行覆盖
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let mut config = self.common.load_config()?;
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.source_dir = Some(source.clone());
        }
        if let Some(output) = &self.output {
            config.output_dir = Some(output.clone());
        }
        if let Some(ext) = &self.ext {
            config.extension = ext.clone();
        }
        if let Some(engine) = self.engine {
            config.engine = engine;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(jobs) = self.jobs {
            config.concurrency = jobs;
        }
        if let Some(deadline) = self.deadline {
            config.deadline_secs = Some(deadline);
        }
        if let Some(report) = &self.report {
            config.report_file = Some(report.clone());
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MergeArgs {
    /// 文章目录
    pub articles: PathBuf,

    /// 输出文件（默认 combined_articles.<格式>）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 输出格式
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pdf)]
    pub format: OutputFormat,

    /// 文档标题
    #[arg(long, default_value = merge::DEFAULT_TITLE)]
    pub title: String,

    /// 标题下方的副标题
    #[arg(long, default_value = merge::DEFAULT_SUBTITLE)]
    pub subtitle: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl MergeArgs {
    /// 合并请求：默认排版之上叠加配置文件中的 `[options]`
    pub fn request(&self, config: &Config) -> MergeRequest {
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| default_merge_output(self.format));

        let mut request = MergeRequest::new(&self.articles, output);
        request.format = self.format;
        request.options = merge::merge_defaults().merged(&config.options);
        request.title = self.title.clone();
        request.subtitle = self.subtitle.clone();
        request
    }
}

fn default_merge_output(format: OutputFormat) -> PathBuf {
    Path::new("combined_articles").with_extension(format.extension())
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// 只检查这个引擎（默认检查配置中的引擎）
    #[arg(short, long, value_enum, conflicts_with = "all")]
    pub engine: Option<EngineKind>,

    /// 检查全部引擎
    #[arg(long, default_value_t = false)]
    pub all: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl CheckArgs {
    pub fn engines(&self, config: &Config) -> Vec<EngineKind> {
        if self.all {
            EngineKind::all().to_vec()
        } else {
            vec![self.engine.unwrap_or(config.engine)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_overrides() {
        let cli = Cli::parse_from([
            "doc_batch_convert",
            "convert",
            "--source",
            "docs",
            "-o",
            "build",
            "--ext",
            ".html",
            "--engine",
            "chromium",
            "-j",
            "3",
            "--deadline",
            "600",
            "-t",
            "30",
        ]);
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };

        let config = args.resolve().unwrap();
        assert_eq!(config.source_dir.as_deref(), Some(Path::new("docs")));
        assert_eq!(config.output_dir.as_deref(), Some(Path::new("build")));
        assert_eq!(config.extension, ".html");
        assert_eq!(config.engine, EngineKind::Chromium);
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.deadline_secs, Some(600));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_merge_request_defaults() {
        let cli = Cli::parse_from(["doc_batch_convert", "merge", "articles", "-f", "docx"]);
        let Command::Merge(args) = cli.command else {
            panic!("expected merge");
        };

        let request = args.request(&Config::default());
        assert_eq!(request.output, PathBuf::from("combined_articles.docx"));
        assert_eq!(request.title, merge::DEFAULT_TITLE);
        assert_eq!(request.options.toc_depth, Some(2));
    }

    #[test]
    fn test_check_engine_selection() {
        let cli = Cli::parse_from(["doc_batch_convert", "check", "--all"]);
        let Command::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.engines(&Config::default()).len(), 4);
    }
}
