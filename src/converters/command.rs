//! 自定义命令转换器
//!
//! 用于接入没有内置支持的工具，例如 DOCX 模板渲染脚本、办公套件的
//! 无头转换模式等。参数模板中的占位符在每个任务上展开。

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, info};

use crate::config::CommandSettings;
use crate::converters::Converter;
use crate::error::ConvertError;
use crate::infrastructure::ToolCommand;
use crate::models::Job;

#[derive(Debug, Clone)]
pub struct CommandConverter {
    settings: CommandSettings,
}

impl CommandConverter {
    pub fn new(settings: CommandSettings) -> Self {
        Self { settings }
    }

    /// 展开参数模板
    ///
    /// 支持 `{input}`、`{output}`、`{output_dir}`、`{stem}`。
    /// 每个参数只扫描一遍，替换进来的路径里即使含有占位符也原样保留。
    pub fn expand_args(&self, job: &Job) -> Vec<String> {
        let input = job.source().to_string_lossy();
        let output = job.output().to_string_lossy();
        let output_dir = job
            .output()
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = job.stem();

        let expand = |caps: &Captures| -> String {
            match &caps[1] {
                "input" => input.to_string(),
                "output" => output.to_string(),
                "output_dir" => output_dir.clone(),
                "stem" => stem.clone(),
                _ => caps[0].to_string(),
            }
        };

        self.settings
            .args
            .iter()
            .map(|arg| match placeholder_pattern() {
                Some(re) => re.replace_all(arg, &expand).into_owned(),
                None => arg.clone(),
            })
            .chain(job.options().extra_args.iter().cloned())
            .collect()
    }
}

fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{(input|output_dir|output|stem)\}").ok())
        .as_ref()
}

impl Converter for CommandConverter {
    fn name(&self) -> &str {
        &self.settings.program
    }

    async fn probe(&self) -> Result<(), ConvertError> {
        let version = ToolCommand::new(&self.settings.program)
            .args(&self.settings.probe_args)
            .probe()
            .await?;
        info!("✓ {} {}", self.settings.program, version);
        Ok(())
    }

    async fn convert(&self, job: &Job) -> Result<(), ConvertError> {
        let args = self.expand_args(job);
        debug!("{} 🔧 {} 参数: {:?}", job, self.settings.program, args);

        ToolCommand::new(&self.settings.program).args(args).run().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversionOptions, EngineKind, OutputFormat};

    #[test]
    fn test_expand_placeholders() {
        let converter = CommandConverter::new(CommandSettings {
            program: "soffice".to_string(),
            args: vec![
                "--headless".to_string(),
                "--convert-to".to_string(),
                "pdf".to_string(),
                "--outdir".to_string(),
                "{output_dir}".to_string(),
                "{input}".to_string(),
                "--name={stem}.{output}".to_string(),
            ],
            probe_args: vec!["--version".to_string()],
        });
        let job = Job::new(
            2,
            "docs/letter.docx",
            "build/letter.pdf",
            EngineKind::Command,
            OutputFormat::Pdf,
            ConversionOptions::default(),
        );

        assert_eq!(
            converter.expand_args(&job),
            vec![
                "--headless",
                "--convert-to",
                "pdf",
                "--outdir",
                "build",
                "docs/letter.docx",
                "--name=letter.build/letter.pdf",
            ]
        );
    }

    #[test]
    fn test_substituted_paths_are_not_rescanned() {
        let converter = CommandConverter::new(CommandSettings {
            program: "render".to_string(),
            args: vec!["{input}".to_string(), "-o".to_string(), "{output}".to_string()],
            probe_args: vec!["--version".to_string()],
        });
        let job = Job::new(
            0,
            "docs/{stem}/{output}.md",
            "build/{output}.pdf",
            EngineKind::Command,
            OutputFormat::Pdf,
            ConversionOptions::default(),
        );

        assert_eq!(
            converter.expand_args(&job),
            vec!["docs/{stem}/{output}.md", "-o", "build/{output}.pdf"]
        );
    }
}
