use async_trait::async_trait;
use bytes::Bytes;

/// 资源下载错误
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP request failed: {status}")]
    Status { status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Resource {0} not found")]
    NotFound(u64),
}

impl FetchError {
    /// 提示框中展示的信息
    pub fn user_message(&self) -> &'static str {
        "Failed to download resource"
    }
}

/// 资源下载接口
///
/// 后端对内容类型不做保证，返回的字节可能与扩展名不符。
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// 下载资源的原始字节
    async fn download_resource(&self, id: u64) -> Result<Bytes, FetchError>;

    /// 客户端类型名称
    fn client_type(&self) -> &str;
}
