//! WeasyPrint 转换器（HTML/CSS → PDF）

use std::ffi::OsString;

use tracing::{debug, info};

use crate::converters::Converter;
use crate::error::ConvertError;
use crate::infrastructure::ToolCommand;
use crate::models::Job;

const PROGRAM: &str = "weasyprint";

#[derive(Debug, Clone)]
pub struct WeasyPrintConverter {
    program: String,
}

impl WeasyPrintConverter {
    pub fn new() -> Self {
        Self {
            program: PROGRAM.to_string(),
        }
    }

    /// 构建命令行参数
    ///
    /// 相对路径的图片和样式表以源文件所在目录为基准解析。
    pub fn build_args(job: &Job) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            job.source().as_os_str().to_os_string(),
            job.output().as_os_str().to_os_string(),
        ];

        for css in &job.options().stylesheets {
            args.push("-s".into());
            args.push(css.as_os_str().to_os_string());
        }

        if let Some(parent) = job.source().parent().filter(|p| !p.as_os_str().is_empty()) {
            args.push("--base-url".into());
            args.push(parent.as_os_str().to_os_string());
        }

        args.extend(job.options().extra_args.iter().map(OsString::from));
        args
    }
}

impl Default for WeasyPrintConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for WeasyPrintConverter {
    fn name(&self) -> &str {
        PROGRAM
    }

    async fn probe(&self) -> Result<(), ConvertError> {
        let version = ToolCommand::new(&self.program).arg("--version").probe().await?;
        info!("✓ {}", version);
        Ok(())
    }

    async fn convert(&self, job: &Job) -> Result<(), ConvertError> {
        let args = Self::build_args(job);
        debug!("{} 🔧 weasyprint 参数: {:?}", job, args);

        ToolCommand::new(&self.program).args(args).run().await?;
        Ok(())
    }
}
