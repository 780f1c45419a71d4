/// 基于 REST 后端的资源下载客户端
use crate::config::PreviewConfig;
use crate::resource::traits::{FetchError, ResourceClient};
use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

/// HTTP 客户端实现 ResourceClient 接口，携带 Bearer token 访问后端
pub struct HttpResourceClient {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl HttpResourceClient {
    pub fn new(base_url: &str, access_token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(&config.api_base_url, config.access_token.clone())
    }

    /// 资源下载地址: {base}/resources/{id}/download/
    pub fn download_url(&self, id: u64) -> Result<Url, FetchError> {
        let raw = format!("{}/resources/{}/download/", self.base_url, id);
        Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn download_resource(&self, id: u64) -> Result<Bytes, FetchError> {
        let url = self.download_url(id)?;
        log::debug!("下载资源 {}: {}", id, url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(id));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }

    fn client_type(&self) -> &str {
        "HTTP"
    }
}
