// 文件类型分类
// 根据文件名和资源声明的类型确定预览类别与代码高亮语法

use serde::{Deserialize, Serialize};
use std::fmt;

/// 纯文本语法标识（未映射的扩展名）
pub const PLAIN_TEXT_GRAMMAR: &str = "text";

/// 扩展名到高亮语法的静态映射表
const GRAMMAR_TABLE: &[(&str, &str)] = &[
    // 编程语言
    ("js", "javascript"),
    ("jsx", "jsx"),
    ("ts", "typescript"),
    ("tsx", "tsx"),
    ("py", "python"),
    ("java", "java"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("cs", "csharp"),
    ("go", "go"),
    ("rb", "ruby"),
    ("php", "php"),
    ("swift", "swift"),
    ("kt", "kotlin"),
    ("rs", "rust"),
    ("scala", "scala"),
    ("dart", "dart"),
    // Web
    ("html", "html"),
    ("css", "css"),
    ("scss", "scss"),
    ("less", "less"),
    // 数据格式
    ("json", "json"),
    ("xml", "xml"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("toml", "toml"),
    // 配置文件
    ("ini", "ini"),
    ("conf", "bash"),
    // Shell 脚本
    ("sh", "bash"),
    ("bash", "bash"),
    ("zsh", "bash"),
    ("bat", "batch"),
    ("ps1", "powershell"),
    // 文档
    ("md", "markdown"),
    ("tex", "latex"),
    // 数据库
    ("sql", "sql"),
    // 其他
    ("csv", "csv"),
    ("log", "text"),
    ("txt", "text"),
];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv"];
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "log"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "tar", "gz", "7z"];

/// 预览内容类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Image,
    Video,
    Pdf,
    Code,
    Markdown,
    Text,
    Archive,
    Unknown,
}

impl ContentCategory {
    /// 根据资源声明的类型字符串判断粗粒度类别
    ///
    /// 只识别 pdf / image / video / markdown / text，其余交给扩展名判断。
    pub fn from_declared(declared: &str) -> Option<Self> {
        let lower = declared.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        if lower.contains("pdf") {
            Some(ContentCategory::Pdf)
        } else if lower.contains("image") {
            Some(ContentCategory::Image)
        } else if lower.contains("video") {
            Some(ContentCategory::Video)
        } else if lower.contains("markdown") {
            Some(ContentCategory::Markdown)
        } else if lower == "text" || lower.starts_with("text/plain") {
            Some(ContentCategory::Text)
        } else {
            None
        }
    }

    /// 根据扩展名判断类别（扩展名需为小写且不含点）
    pub fn from_extension(ext: &str) -> Self {
        if ext == "pdf" {
            ContentCategory::Pdf
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            ContentCategory::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            ContentCategory::Video
        } else if MARKDOWN_EXTENSIONS.contains(&ext) {
            ContentCategory::Markdown
        } else if TEXT_EXTENSIONS.contains(&ext) {
            ContentCategory::Text
        } else if ext == "zip" {
            ContentCategory::Archive
        } else if grammar_for_extension(ext).is_some() {
            ContentCategory::Code
        } else {
            ContentCategory::Unknown
        }
    }

    /// 文本类内容会被预先解码为字符串
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            ContentCategory::Text | ContentCategory::Code | ContentCategory::Markdown
        )
    }

    /// 压缩包内的条目不再继续展开嵌套压缩包
    pub fn for_entry(self) -> Self {
        match self {
            ContentCategory::Archive => ContentCategory::Unknown,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Image => "image",
            ContentCategory::Video => "video",
            ContentCategory::Pdf => "pdf",
            ContentCategory::Code => "code",
            ContentCategory::Markdown => "markdown",
            ContentCategory::Text => "text",
            ContentCategory::Archive => "archive",
            ContentCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: ContentCategory,
    /// 仅当类别为 Code 时存在
    pub grammar: Option<&'static str>,
}

impl Classification {
    fn new(category: ContentCategory, ext: &str) -> Self {
        let grammar = match category {
            ContentCategory::Code => Some(grammar_for_extension(ext).unwrap_or(PLAIN_TEXT_GRAMMAR)),
            _ => None,
        };
        Self { category, grammar }
    }
}

/// 获取小写扩展名（不含点），没有扩展名时返回空字符串
pub fn extension_of(filename: &str) -> String {
    let name = filename.rsplit('/').next().unwrap_or(filename);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// 查询扩展名对应的高亮语法
pub fn grammar_for_extension(ext: &str) -> Option<&'static str> {
    GRAMMAR_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, grammar)| *grammar)
}

/// 文件名对应的高亮语法，未映射时为纯文本
pub fn grammar_for_filename(filename: &str) -> &'static str {
    grammar_for_extension(&extension_of(filename)).unwrap_or(PLAIN_TEXT_GRAMMAR)
}

/// 是否为可浏览的压缩包（仅按 .zip 后缀判断）
pub fn is_archive(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".zip")
}

/// 对文件进行分类
///
/// 调用方声明的类型优先用于 pdf / image / video / markdown / text；
/// 声明为 code 时类别为 Code，语法仍来自扩展名表。
/// 其他情况按扩展名判断，压缩包与代码语法只能通过扩展名识别。
pub fn classify(filename: &str, declared: Option<&str>) -> Classification {
    let ext = extension_of(filename);

    if let Some(declared) = declared {
        if let Some(category) = ContentCategory::from_declared(declared) {
            return Classification::new(category, &ext);
        }
        if declared.trim().eq_ignore_ascii_case("code") && !is_archive(filename) {
            return Classification::new(ContentCategory::Code, &ext);
        }
    }

    if is_archive(filename) {
        return Classification::new(ContentCategory::Archive, &ext);
    }

    Classification::new(ContentCategory::from_extension(&ext), &ext)
}

/// 资源卡片使用的图标种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Document,
    Code,
    Video,
    Image,
    Archive,
    Other,
}

impl ResourceKind {
    pub fn detect(declared: &str, filename: &str) -> Self {
        let declared = declared.to_lowercase();
        let ext = extension_of(filename);
        let category = ContentCategory::from_extension(&ext);

        if declared.contains("pdf") || declared == "document" || category == ContentCategory::Pdf {
            ResourceKind::Document
        } else if declared.contains("code") || category == ContentCategory::Code {
            ResourceKind::Code
        } else if declared.contains("video") || category == ContentCategory::Video {
            ResourceKind::Video
        } else if declared.contains("image") || category == ContentCategory::Image {
            ResourceKind::Image
        } else if declared.contains("zip") || ARCHIVE_EXTENSIONS.contains(&ext.as_str()) {
            ResourceKind::Archive
        } else {
            ResourceKind::Other
        }
    }
}
