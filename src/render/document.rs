//! 结构化文本的辅助处理：JSON 格式化、CSV 表格、LaTeX 公式提取

const EQUATION_BEGIN: &str = "\\begin{equation}";
const EQUATION_END: &str = "\\end{equation}";

/// 格式化 JSON，解析失败时返回原文
pub fn format_json(source: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(source) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| source.to_string()),
        Err(e) => {
            log::debug!("JSON 解析失败，按原文显示: {}", e);
            source.to_string()
        }
    }
}

/// 简单 CSV 解析：按行、按逗号拆分
pub fn parse_csv(source: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = source
        .split('\n')
        .map(|line| {
            line.trim_end_matches('\r')
                .split(',')
                .map(str::to_string)
                .collect()
        })
        .collect();

    // 末尾换行产生的空行
    if rows.last().is_some_and(|row| row.len() == 1 && row[0].is_empty()) {
        rows.pop();
    }
    rows
}

/// 是否包含常见的 LaTeX 结构
pub fn is_latex_content(content: &str) -> bool {
    content.contains("\\documentclass")
        || content.contains("\\begin{document}")
        || (content.contains("\\begin{") && content.contains("\\end{"))
        || content.contains("\\section{")
        || content.contains("\\subsection{")
}

/// 提取 `$$...$$`、`$...$` 与 equation 环境中的公式
pub fn extract_math_expressions(content: &str) -> Vec<String> {
    let mut expressions = Vec::new();
    let mut pos = 0;

    while pos < content.len() {
        let rest = &content[pos..];
        let dollar = rest.find('$');
        let equation = rest.find(EQUATION_BEGIN);

        let start = match (dollar, equation) {
            (Some(d), Some(e)) => d.min(e),
            (Some(d), None) => d,
            (None, Some(e)) => e,
            (None, None) => break,
        };
        let at = &rest[start..];

        if at.starts_with(EQUATION_BEGIN) {
            let body = &at[EQUATION_BEGIN.len()..];
            if let Some(end) = body.find(EQUATION_END) {
                push_expression(&mut expressions, &body[..end]);
                pos += start + EQUATION_BEGIN.len() + end + EQUATION_END.len();
                continue;
            }
            pos += start + 1;
            continue;
        }

        if let Some(body) = at.strip_prefix("$$") {
            if let Some(end) = body.find("$$") {
                push_expression(&mut expressions, &body[..end]);
                pos += start + 2 + end + 2;
                continue;
            }
        }

        let body = &at[1..];
        match body.find('$') {
            Some(end) => {
                push_expression(&mut expressions, &body[..end]);
                pos += start + 1 + end + 1;
            }
            None => pos += start + 1,
        }
    }

    expressions
}

fn push_expression(expressions: &mut Vec<String>, raw: &str) {
    if !raw.is_empty() {
        expressions.push(raw.trim().to_string());
    }
}
