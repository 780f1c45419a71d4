//! 基于 syntect 的代码高亮
//!
//! 语法集与主题在首次使用时加载。行号作为单独一列保存在 `HighlightedLine::number`，
//! 不混入高亮文本。

use crate::classify::PLAIN_TEXT_GRAMMAR;
use once_cell::sync::Lazy;
use serde::Serialize;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// 默认主题（浅色，接近 GitHub 风格）
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// 最多高亮的行数，超出部分以纯文本显示
const MAX_HIGHLIGHT_LINES: usize = 10_000;

/// 带样式的文本片段
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledSpan {
    pub text: String,
    /// #rrggbb，纯文本时为 None
    pub color: Option<String>,
    pub bold: bool,
    pub italic: bool,
}

impl StyledSpan {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            color: None,
            bold: false,
            italic: false,
        }
    }
}

/// 高亮后的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightedLine {
    /// 行号，从 1 开始
    pub number: usize,
    pub spans: Vec<StyledSpan>,
}

impl HighlightedLine {
    /// 该行的原始文本（不含换行符）
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

/// 语法标识到 syntect token 的映射
fn syntect_token(grammar: &str) -> Option<&'static str> {
    let token = match grammar {
        "javascript" | "jsx" | "typescript" | "tsx" => "js",
        "python" => "py",
        "java" => "java",
        "c" => "c",
        "cpp" => "cpp",
        "csharp" => "cs",
        "go" => "go",
        "ruby" => "rb",
        "php" => "php",
        "rust" => "rs",
        "scala" => "scala",
        "html" => "html",
        "css" | "scss" | "less" => "css",
        "json" => "json",
        "xml" => "xml",
        "yaml" => "yaml",
        "bash" => "sh",
        "batch" => "bat",
        "latex" => "tex",
        "sql" => "sql",
        "markdown" => "md",
        _ => return None,
    };
    Some(token)
}

fn find_syntax(grammar: &str) -> &'static SyntaxReference {
    let ss = &*SYNTAX_SET;
    if grammar == PLAIN_TEXT_GRAMMAR {
        return ss.find_syntax_plain_text();
    }
    syntect_token(grammar)
        .and_then(|token| ss.find_syntax_by_token(token))
        .or_else(|| ss.find_syntax_by_token(grammar))
        .unwrap_or_else(|| ss.find_syntax_plain_text())
}

fn find_theme(name: &str) -> Option<&'static Theme> {
    let themes = &THEME_SET.themes;
    themes
        .get(name)
        .or_else(|| themes.get(DEFAULT_THEME))
        .or_else(|| themes.values().next())
}

/// 高亮代码，返回逐行结果
pub fn highlight(code: &str, grammar: &str, theme: &str) -> Vec<HighlightedLine> {
    let syntax = find_syntax(grammar);
    let mut highlighter = find_theme(theme).map(|theme| HighlightLines::new(syntax, theme));

    let mut lines = Vec::new();
    for (index, line) in LinesWithEndings::from(code).enumerate() {
        let content = line.trim_end_matches(['\n', '\r']);
        let spans = match highlighter.as_mut() {
            Some(h) if index < MAX_HIGHLIGHT_LINES => match h.highlight_line(line, &SYNTAX_SET) {
                Ok(ranges) => merge_spans(&ranges),
                Err(e) => {
                    log::debug!("第 {} 行高亮失败: {}", index + 1, e);
                    vec![StyledSpan::plain(content)]
                }
            },
            _ => vec![StyledSpan::plain(content)],
        };

        lines.push(HighlightedLine {
            number: index + 1,
            spans,
        });
    }

    lines
}

/// 合并相邻同色片段并去掉行尾换行
fn merge_spans(ranges: &[(syntect::highlighting::Style, &str)]) -> Vec<StyledSpan> {
    let mut merged: Vec<StyledSpan> = Vec::new();

    for (style, text) in ranges {
        let text = text.trim_end_matches(['\n', '\r']);
        if text.is_empty() {
            continue;
        }

        let fg = style.foreground;
        let color = Some(format!("#{:02x}{:02x}{:02x}", fg.r, fg.g, fg.b));
        let bold = style.font_style.contains(FontStyle::BOLD);
        let italic = style.font_style.contains(FontStyle::ITALIC);

        match merged.last_mut() {
            Some(last) if last.color == color && last.bold == bold && last.italic == italic => {
                last.text.push_str(text);
            }
            _ => merged.push(StyledSpan {
                text: text.to_string(),
                color,
                bold,
                italic,
            }),
        }
    }

    merged
}
