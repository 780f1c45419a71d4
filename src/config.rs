use crate::archive::DEFAULT_MAX_UNCOMPRESSED_BYTES;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// 预览配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// REST 后端地址，例如 http://localhost:8000/api
    pub api_base_url: String,
    pub access_token: Option<String>,
    /// 分栏比例下限
    pub split_ratio_min: f32,
    /// 分栏比例上限
    pub split_ratio_max: f32,
    pub split_ratio_default: f32,
    /// syntect 主题名称
    pub highlight_theme: String,
    /// 是否转义 Markdown 中的原始 HTML
    pub sanitize_markdown_html: bool,
    /// 允许在内存中解压的压缩包最大字节数
    pub max_archive_bytes: u64,
    /// 解压后所有条目的总字节数上限
    pub max_uncompressed_bytes: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            access_token: None,
            split_ratio_min: 0.10,
            split_ratio_max: 0.50,
            split_ratio_default: 0.25,
            highlight_theme: "InspiredGitHub".to_string(),
            sanitize_markdown_html: false,
            max_archive_bytes: 200 * 1024 * 1024,
            max_uncompressed_bytes: DEFAULT_MAX_UNCOMPRESSED_BYTES,
        }
    }
}

impl PreviewConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PreviewConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max, default) = (
            self.split_ratio_min,
            self.split_ratio_max,
            self.split_ratio_default,
        );

        if !(0.0..1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "split ratio bounds must lie in (0, 1]: {}..{}",
                min, max
            )));
        }
        if min >= max {
            return Err(ConfigError::Invalid(format!(
                "split_ratio_min ({}) must be below split_ratio_max ({})",
                min, max
            )));
        }
        if !(min..=max).contains(&default) {
            return Err(ConfigError::Invalid(format!(
                "split_ratio_default ({}) must lie within {}..{}",
                default, min, max
            )));
        }
        if self.max_archive_bytes == 0 || self.max_uncompressed_bytes == 0 {
            return Err(ConfigError::Invalid(
                "archive size limits must be greater than zero".to_string(),
            ));
        }
        if url::Url::parse(&self.api_base_url).is_err() {
            return Err(ConfigError::Invalid(format!(
                "api_base_url is not a valid URL: {}",
                self.api_base_url
            )));
        }
        Ok(())
    }
}
