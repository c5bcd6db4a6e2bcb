//! 文章合并服务
//!
//! 把一个目录中按日期命名的 Markdown 文章合并为一份文档：
//! 每篇文章以标题和日期开头，文章之间分页。合并后的 Markdown
//! 作为临时文件交给调用器转换，结束后删除。

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tokio::fs;
use tracing::{info, warn};

use crate::converters::Converter;
use crate::error::{AppError, AppResult};
use crate::infrastructure::remove_partial_output;
use crate::models::{ConversionOptions, ConversionResult, EngineKind, Job, OutputFormat};
use crate::services::enumerator::list_sources;
use crate::services::invoker::ConverterInvoker;

/// 默认文档标题
pub const DEFAULT_TITLE: &str = "文章合集";
/// 默认副标题
pub const DEFAULT_SUBTITLE: &str = "*技术文档与研究文章汇编*";

const PAGE_BREAK: &str = "\\newpage";

/// 一篇待合并的文章
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub path: PathBuf,
    pub date: String,
    pub title: String,
}

/// 合并请求
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub articles_dir: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub options: ConversionOptions,
    pub title: String,
    pub subtitle: String,
}

impl MergeRequest {
    pub fn new(articles_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            articles_dir: articles_dir.into(),
            output: output.into(),
            format: OutputFormat::Pdf,
            options: merge_defaults(),
            title: DEFAULT_TITLE.to_string(),
            subtitle: DEFAULT_SUBTITLE.to_string(),
        }
    }

    /// 合并后的临时 Markdown，与输出文件放在同一目录
    pub fn scratch_path(&self) -> PathBuf {
        let stem = self
            .output
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        self.output.with_file_name(format!("{}.merge-tmp.md", stem))
    }
}

/// 合并文档的默认排版：1 英寸页边距、11pt、彩色链接、两级目录、章节编号
pub fn merge_defaults() -> ConversionOptions {
    ConversionOptions {
        margin: Some("1in".to_string()),
        font_size: Some("11pt".to_string()),
        toc: Some(true),
        toc_depth: Some(2),
        number_sections: Some(true),
        variables: [
            ("colorlinks", "true"),
            ("linkcolor", "blue"),
            ("urlcolor", "blue"),
            ("citecolor", "green"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
        ..Default::default()
    }
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// 解析文章文件名，返回 `(日期, 标题)`
///
/// 支持 `YYYY-MM-DD - 标题.md` 和 `YYYY-MM-DD CODE - 标题.md`，
/// 其余以日期开头的文件名把日期之后的部分整体当作标题。
pub fn parse_article_name(file_name: &str) -> Option<(String, String)> {
    static FULL: OnceLock<Option<Regex>> = OnceLock::new();
    static DATE: OnceLock<Option<Regex>> = OnceLock::new();

    let full = cached(&FULL, r"^(\d{4}-\d{2}-\d{2})(?:\s+[^\s-]+)?\s*-\s*(.+)\.md$");
    if let Some(caps) = full.and_then(|re| re.captures(file_name)) {
        return Some((caps[1].to_string(), caps[2].trim().to_string()));
    }

    let date = cached(&DATE, r"^(\d{4}-\d{2}-\d{2})")?
        .captures(file_name)?
        .get(1)?
        .as_str()
        .to_string();
    let rest = file_name[date.len()..].trim_start();
    let title = rest.strip_suffix(".md").unwrap_or(rest).trim();
    let title = if title.is_empty() { date.clone() } else { title.to_string() };

    Some((date, title))
}

/// 去掉开头 `---` 包围的 YAML 元数据
pub fn strip_front_matter(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("---") else {
        return content.trim();
    };
    match rest.find("---") {
        Some(end) => rest[end + 3..].trim(),
        None => rest.trim(),
    }
}

/// 收集目录中的文章，按文件名排序
pub async fn collect_articles(dir: &Path) -> AppResult<Vec<Article>> {
    let mut articles = Vec::new();

    for path in list_sources(dir, "md").await? {
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        match parse_article_name(&file_name) {
            Some((date, title)) => articles.push(Article { path, date, title }),
            None => warn!("⚠️ 文件名中没有日期，跳过: {}", file_name),
        }
    }

    if articles.is_empty() {
        return Err(AppError::NothingToMerge {
            path: dir.to_path_buf(),
        });
    }
    Ok(articles)
}

/// 组装合并后的 Markdown
///
/// `sections` 为 `(文章, 正文)`，正文已去掉元数据。
pub fn compose_markdown(title: &str, subtitle: &str, sections: &[(Article, String)]) -> String {
    let heading = format!("# {}", title);
    let front = [heading.as_str(), subtitle, "", PAGE_BREAK, ""];

    let mut blocks = Vec::with_capacity(sections.len());
    for (article, body) in sections {
        blocks.push(format!("# {}\n## {}\n\n{}", article.title, article.date, body));
    }

    let page_break = format!("\n\n{}\n\n", PAGE_BREAK);
    let articles = blocks.join(&page_break);

    let mut document = front.join("\n");
    document.push('\n');
    document.push_str(&articles);
    document
}

/// 读取文章正文，读取失败的文章跳过
async fn load_sections(articles: Vec<Article>) -> Vec<(Article, String)> {
    let mut sections = Vec::with_capacity(articles.len());
    for article in articles {
        match fs::read_to_string(&article.path).await {
            Ok(content) => {
                let body = strip_front_matter(&content).to_string();
                sections.push((article, body));
            }
            Err(e) => warn!("⚠️ 读取文章失败，跳过 {}: {}", article.path.display(), e),
        }
    }
    sections
}

/// 合并并转换
///
/// 临时文件在任何情况下都会被删除。
pub async fn merge_articles<C: Converter>(
    invoker: &ConverterInvoker<C>,
    request: &MergeRequest,
) -> AppResult<ConversionResult> {
    let articles = collect_articles(&request.articles_dir).await?;
    info!("📁 找到 {} 篇文章", articles.len());

    let sections = load_sections(articles).await;
    if sections.is_empty() {
        return Err(AppError::NothingToMerge {
            path: request.articles_dir.clone(),
        });
    }

    info!("📝 正在生成合并后的 Markdown...");
    let markdown = compose_markdown(&request.title, &request.subtitle, &sections);

    let scratch = request.scratch_path();
    let write_error = |source| AppError::Write {
        path: scratch.clone(),
        source,
    };
    if let Some(parent) = scratch.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    fs::write(&scratch, markdown).await.map_err(write_error)?;

    let job = Job::new(
        0,
        &scratch,
        &request.output,
        EngineKind::Pandoc,
        request.format,
        request.options.clone(),
    );
    info!("📖 正在转换合并文档: {}", request.output.display());
    let mut result = invoker.invoke(&job).await;

    remove_partial_output(&scratch).await;

    result.source = request.articles_dir.clone();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_code() {
        assert_eq!(
            parse_article_name("2024-03-18 ML - Transformer Notes.md"),
            Some(("2024-03-18".to_string(), "Transformer Notes".to_string()))
        );
    }

    #[test]
    fn test_parse_without_code() {
        assert_eq!(
            parse_article_name("2023-11-02 - Sistemi distribuiti.md"),
            Some(("2023-11-02".to_string(), "Sistemi distribuiti".to_string()))
        );
    }

    #[test]
    fn test_parse_fallback_and_reject() {
        assert_eq!(
            parse_article_name("2024-01-05 Weekly update.md"),
            Some(("2024-01-05".to_string(), "Weekly update".to_string()))
        );
        assert_eq!(
            parse_article_name("2024-01-05.md"),
            Some(("2024-01-05".to_string(), "2024-01-05".to_string()))
        );
        assert_eq!(parse_article_name("README.md"), None);
    }

    #[test]
    fn test_strip_front_matter() {
        assert_eq!(strip_front_matter("---\ntitle: x\n---\n\nBody text\n"), "Body text");
        assert_eq!(strip_front_matter("---\nunterminated"), "unterminated");
        assert_eq!(strip_front_matter("\nPlain body\n"), "Plain body");
    }

    #[test]
    fn test_compose_breaks_between_articles_only() {
        let article = |date: &str, title: &str| Article {
            path: PathBuf::from(format!("{}.md", date)),
            date: date.to_string(),
            title: title.to_string(),
        };
        let sections = vec![
            (article("2024-01-01", "First"), "one".to_string()),
            (article("2024-02-01", "Second"), "two".to_string()),
        ];

        let markdown = compose_markdown("合集", "*副标题*", &sections);

        assert!(markdown.starts_with("# 合集\n*副标题*\n\n\\newpage\n\n# First\n## 2024-01-01\n\none"));
        assert_eq!(markdown.matches(PAGE_BREAK).count(), 2);
        assert!(markdown.ends_with("# Second\n## 2024-02-01\n\ntwo"));
    }

    #[tokio::test]
    async fn test_collect_skips_undated() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("2024-02-01 - B.md"), "b").unwrap();
        std::fs::write(dir.path().join("2024-01-01 - A.md"), "a").unwrap();
        std::fs::write(dir.path().join("notes.md"), "n").unwrap();

        let articles = collect_articles(dir.path()).await.unwrap();
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_collect_nothing_to_merge() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.md"), "n").unwrap();
        let err = collect_articles(dir.path()).await.unwrap_err();
        assert!(matches!(err, AppError::NothingToMerge { .. }));
    }
}
