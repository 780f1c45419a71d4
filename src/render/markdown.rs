//! Markdown 渲染

use pulldown_cmark::{html, Event, Options, Parser};

/// 将 Markdown 渲染为 HTML
///
/// 开启 GFM 表格、删除线与任务列表，单个换行渲染为 `<br />`。
/// 原始 HTML 默认原样输出；`sanitize` 为 true 时转义为文本。
pub fn render_markdown_to_html(markdown: &str, sanitize: bool) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        Event::Html(raw) | Event::InlineHtml(raw) if sanitize => Event::Text(raw),
        other => other,
    });

    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}
