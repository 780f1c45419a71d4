// 内容渲染
// 根据分类结果与可用数据（URL 或文本）生成具体的展示形式

pub mod document;
pub mod highlight;
pub mod markdown;

use crate::classify::{grammar_for_filename, ContentCategory};
use crate::config::PreviewConfig;
use highlight::HighlightedLine;
use serde::Serialize;

pub const UNAVAILABLE_MESSAGE: &str = "Preview not available for this file type.";
pub const UNAVAILABLE_HINT: &str = "Please download the file to view its contents.";

/// LaTeX 视图中最多展示的公式数量
const MAX_MATH_PREVIEW: usize = 5;

/// 渲染结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Presentation {
    /// 单文件下载尚未完成
    Loading,
    /// PDF 嵌入框
    Frame { url: String, title: String },
    Image { url: String, alt: String },
    Video { url: String },
    Markdown { html: String },
    Code {
        grammar: String,
        lines: Vec<HighlightedLine>,
    },
    /// 等宽、保留空白的纯文本
    Text { text: String },
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Latex {
        source: Vec<HighlightedLine>,
        math: Vec<String>,
        hidden_math: usize,
    },
    /// 无法预览，提示下载
    Unavailable {
        file_name: String,
        message: String,
        hint: String,
        download_url: Option<String>,
    },
}

impl Presentation {
    pub fn unavailable(file_name: &str, download_url: Option<String>) -> Self {
        Presentation::Unavailable {
            file_name: file_name.to_string(),
            message: UNAVAILABLE_MESSAGE.to_string(),
            hint: UNAVAILABLE_HINT.to_string(),
            download_url,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Presentation::Unavailable { .. })
    }
}

/// 渲染所需的数据
#[derive(Debug, Clone, Default)]
pub struct RenderPayload<'a> {
    pub file_name: &'a str,
    /// 对象引用 URL
    pub url: Option<String>,
    /// 预先解码的文本
    pub text: Option<&'a str>,
    /// 代码高亮语法，缺省时按文件名推断
    pub grammar: Option<&'a str>,
}

/// 渲染选项
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub theme: String,
    pub sanitize_markdown_html: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            theme: highlight::DEFAULT_THEME.to_string(),
            sanitize_markdown_html: false,
        }
    }
}

impl From<&PreviewConfig> for RenderOptions {
    fn from(config: &PreviewConfig) -> Self {
        Self {
            theme: config.highlight_theme.clone(),
            sanitize_markdown_html: config.sanitize_markdown_html,
        }
    }
}

/// 按类别生成展示形式；缺少数据时返回 Unavailable，不会报错
pub fn render(
    category: ContentCategory,
    payload: RenderPayload<'_>,
    options: &RenderOptions,
) -> Presentation {
    let RenderPayload {
        file_name,
        url,
        text,
        grammar,
    } = payload;

    match (category, url, text) {
        (ContentCategory::Pdf, Some(url), _) => Presentation::Frame {
            url,
            title: file_name.to_string(),
        },
        (ContentCategory::Image, Some(url), _) => Presentation::Image {
            url,
            alt: file_name.to_string(),
        },
        (ContentCategory::Video, Some(url), _) => Presentation::Video { url },
        (ContentCategory::Markdown, _, Some(text)) => Presentation::Markdown {
            html: markdown::render_markdown_to_html(text, options.sanitize_markdown_html),
        },
        (ContentCategory::Code, _, Some(text)) => {
            let grammar = grammar.unwrap_or_else(|| grammar_for_filename(file_name));
            render_code(text, grammar, options)
        }
        (ContentCategory::Text, _, Some(text)) => {
            if document::is_latex_content(text) {
                render_latex(text, options)
            } else {
                Presentation::Text {
                    text: text.to_string(),
                }
            }
        }
        // 没有渲染器，或缺少该类别需要的数据
        (
            ContentCategory::Archive
            | ContentCategory::Unknown
            | ContentCategory::Pdf
            | ContentCategory::Image
            | ContentCategory::Video
            | ContentCategory::Markdown
            | ContentCategory::Code
            | ContentCategory::Text,
            url,
            _,
        ) => Presentation::unavailable(file_name, url),
    }
}

/// 资源描述按 Markdown 渲染
pub fn render_description(description: &str, options: &RenderOptions) -> Presentation {
    Presentation::Markdown {
        html: markdown::render_markdown_to_html(description, options.sanitize_markdown_html),
    }
}

fn render_code(text: &str, grammar: &str, options: &RenderOptions) -> Presentation {
    match grammar {
        "json" => Presentation::Code {
            grammar: grammar.to_string(),
            lines: highlight::highlight(&document::format_json(text), grammar, &options.theme),
        },
        "csv" => {
            let mut rows = document::parse_csv(text);
            if rows.is_empty() {
                return Presentation::Text {
                    text: text.to_string(),
                };
            }
            let header = rows.remove(0);
            Presentation::Table { header, rows }
        }
        "latex" => render_latex(text, options),
        _ => Presentation::Code {
            grammar: grammar.to_string(),
            lines: highlight::highlight(text, grammar, &options.theme),
        },
    }
}

fn render_latex(text: &str, options: &RenderOptions) -> Presentation {
    let mut math = document::extract_math_expressions(text);
    let hidden_math = math.len().saturating_sub(MAX_MATH_PREVIEW);
    math.truncate(MAX_MATH_PREVIEW);

    Presentation::Latex {
        source: highlight::highlight(text, "latex", &options.theme),
        math,
        hidden_math,
    }
}
