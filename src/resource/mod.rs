pub mod http_client;
pub mod traits;

pub use http_client::HttpResourceClient;
pub use traits::{FetchError, ResourceClient};

use crate::classify::{classify, Classification, ContentCategory, ResourceKind};
use serde::{Deserialize, Serialize};

/// 后端返回的资源元数据（只包含预览需要的字段）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 资源类型提示，例如 pdf / video / code / document
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME 类型
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl ResourceMetadata {
    /// 用于分类与展示的文件名，缺失时退回标题
    pub fn display_file_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(&self.title)
    }

    /// 分类：先看 type，再看 file_type，最后按扩展名
    pub fn classification(&self) -> Classification {
        let declared = [Some(self.resource_type.as_str()), self.file_type.as_deref()]
            .into_iter()
            .flatten()
            .find(|declared| ContentCategory::from_declared(declared).is_some())
            .unwrap_or(self.resource_type.as_str());
        classify(self.display_file_name(), Some(declared))
    }

    pub fn kind(&self) -> ResourceKind {
        ResourceKind::detect(&self.resource_type, self.display_file_name())
    }

    pub fn formatted_size(&self) -> Option<String> {
        self.file_size.map(format_file_size)
    }
}

/// 人类可读的文件大小
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1_048_576 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    }
}
