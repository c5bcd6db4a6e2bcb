//! 任务枚举服务
//!
//! 只负责"目录 → 有序任务列表"，只读，不碰输出目录。
//! 输出路径与源文件重合、或多个源文件映射到同一输出时，整批拒绝。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::{ConversionOptions, EngineKind, Job, OutputFormat};

/// 任务的输入输出布局
#[derive(Debug, Clone, Copy)]
pub struct JobLayout<'a> {
    pub source_dir: &'a Path,
    pub output_dir: &'a Path,
    /// 扩展名过滤，前导点可有可无，不区分大小写
    pub extension: &'a str,
    pub engine: EngineKind,
    pub format: OutputFormat,
}

/// 按配置枚举任务，并解析每个文件的选项覆盖
pub async fn enumerate_jobs(config: &Config) -> AppResult<Vec<Job>> {
    let layout = JobLayout {
        source_dir: config.source_dir()?,
        output_dir: config.output_dir()?,
        extension: &config.extension,
        engine: config.engine,
        format: config.format,
    };

    let sources = list_sources(layout.source_dir, layout.extension).await?;
    let jobs: Vec<Job> = sources
        .into_iter()
        .enumerate()
        .map(|(index, source)| {
            let file_name = source
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            let options = config.options_for(&file_name);
            build_job(&layout, index, source, options)
        })
        .collect();

    check_outputs(&jobs).await?;
    Ok(jobs)
}

/// 输出路径检查
///
/// - 输出文件解析后与源文件相同 → `OutputOverwritesSource`
/// - 两个任务的输出路径相同（如 `a.MD` 与 `a.md`） → `DuplicateOutput`
async fn check_outputs(jobs: &[Job]) -> Result<(), ConfigError> {
    let mut claimed: HashMap<&Path, &Path> = HashMap::with_capacity(jobs.len());

    for job in jobs {
        if same_file(job.source(), job.output()).await {
            return Err(ConfigError::OutputOverwritesSource {
                path: job.output().to_path_buf(),
            });
        }

        if let Some(first) = claimed.insert(job.output(), job.source()) {
            return Err(ConfigError::DuplicateOutput {
                first: first.to_path_buf(),
                second: job.source().to_path_buf(),
                output: job.output().to_path_buf(),
            });
        }
    }
    Ok(())
}

/// 两个路径是否指向同一个文件；输出还不存在时比较词法路径
async fn same_file(source: &Path, output: &Path) -> bool {
    if source == output {
        return true;
    }
    match (fs::canonicalize(source).await, fs::canonicalize(output).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// 列出目录下匹配扩展名的普通文件（不递归），按路径字典序排列
pub async fn list_sources(dir: &Path, extension: &str) -> AppResult<Vec<PathBuf>> {
    let is_dir = fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false);
    if !is_dir {
        return Err(AppError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let wanted = extension.trim_start_matches('.');
    let read_dir_error = |source| AppError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut sources = Vec::new();
    let mut entries = fs::read_dir(dir).await.map_err(read_dir_error)?;

    while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
        let path = entry.path();

        // 跟随符号链接，只保留最终指向普通文件的条目
        let is_file = fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
        if matches {
            debug!("发现源文件: {}", path.display());
            sources.push(path);
        }
    }

    sources.sort();
    info!("📁 {} 中共有 {} 个 .{} 文件", dir.display(), sources.len(), wanted);
    Ok(sources)
}

fn build_job(
    layout: &JobLayout<'_>,
    index: usize,
    source: PathBuf,
    options: ConversionOptions,
) -> Job {
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    let output = layout
        .output_dir
        .join(format!("{}.{}", stem, layout.format.extension()));
    Job::new(index, source, output, layout.engine, layout.format, options)
}
