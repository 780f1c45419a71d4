// 资源预览会话
// 每个打开的预览对话框对应一个会话：下载、分类、构建压缩包树或单文件视图，关闭时释放全部引用

use crate::archive::builder::decode_text;
use crate::archive::{ArchiveError, ZipTreeBuilder};
use crate::archive::ArchiveTree;
use crate::blob::{ObjectRef, ObjectStore};
use crate::classify::{Classification, ContentCategory};
use crate::config::PreviewConfig;
use crate::navigator::{ArchiveNavigator, BuildTicket, PreviewPhase, SplitBounds};
use crate::render::{self, Presentation, RenderOptions, RenderPayload};
use crate::resource::{FetchError, ResourceClient, ResourceMetadata};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

/// 预览加载错误
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("Failed to download resource: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to process archive: {0}")]
    Archive(#[from] ArchiveError),
}

impl PreviewError {
    pub fn user_message(&self) -> &'static str {
        match self {
            PreviewError::Fetch(e) => e.user_message(),
            PreviewError::Archive(e) => e.user_message(),
        }
    }
}

/// 单个（非压缩包）文件的预览数据
pub struct SingleFile {
    pub file_name: String,
    pub classification: Classification,
    pub object_ref: ObjectRef,
    pub inline_text: Option<String>,
    store: ObjectStore,
}

impl SingleFile {
    fn payload(&self) -> RenderPayload<'_> {
        RenderPayload {
            file_name: &self.file_name,
            url: Some(self.object_ref.url()),
            text: self.inline_text.as_deref(),
            grammar: self.classification.grammar,
        }
    }
}

impl Drop for SingleFile {
    fn drop(&mut self) {
        self.store.release(&self.object_ref);
    }
}

impl std::fmt::Debug for SingleFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFile")
            .field("file_name", &self.file_name)
            .field("classification", &self.classification)
            .field("object_ref", &self.object_ref)
            .finish()
    }
}

/// 加载完成的内容
#[derive(Debug)]
pub enum LoadedContent {
    Single(SingleFile),
    Archive(ArchiveTree),
}

/// 下载并处理资源，不持有会话状态，可在独立任务中运行
#[derive(Clone)]
pub struct PreviewLoader {
    client: Arc<dyn ResourceClient>,
    store: ObjectStore,
    max_archive_bytes: u64,
    max_uncompressed_bytes: u64,
}

impl PreviewLoader {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        store: ObjectStore,
        config: &PreviewConfig,
    ) -> Self {
        Self {
            client,
            store,
            max_archive_bytes: config.max_archive_bytes,
            max_uncompressed_bytes: config.max_uncompressed_bytes,
        }
    }

    pub async fn load(
        &self,
        resource: &ResourceMetadata,
    ) -> Result<LoadedContent, PreviewError> {
        log::debug!(
            "通过 {} 客户端下载资源 {}",
            self.client.client_type(),
            resource.id
        );
        let data = self.client.download_resource(resource.id).await?;
        let classification = resource.classification();
        log::debug!(
            "资源 {} 下载完成 ({} 字节, 类别 {})",
            resource.id,
            data.len(),
            classification.category
        );

        if classification.category == ContentCategory::Archive {
            let size = data.len() as u64;
            if size > self.max_archive_bytes {
                return Err(ArchiveError::TooLarge {
                    size,
                    limit: self.max_archive_bytes,
                }
                .into());
            }
            let tree = ZipTreeBuilder::new(self.store.clone())
                .with_max_uncompressed_bytes(self.max_uncompressed_bytes)
                .build(data)
                .await?;
            return Ok(LoadedContent::Archive(tree));
        }

        Ok(LoadedContent::Single(self.single_file(resource, classification, data)))
    }

    fn single_file(
        &self,
        resource: &ResourceMetadata,
        classification: Classification,
        data: Bytes,
    ) -> SingleFile {
        let file_name = resource.display_file_name().to_string();
        let inline_text = if classification.category.is_text_like() {
            match decode_text(&file_name, &data) {
                Ok(text) => Some(text),
                Err(e) => {
                    log::debug!("{}，仅保留对象引用", e);
                    None
                }
            }
        } else {
            None
        };

        SingleFile {
            file_name,
            classification,
            object_ref: self.store.acquire(data),
            inline_text,
            store: self.store.clone(),
        }
    }
}

/// 打开操作的票据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenTicket {
    generation: u64,
    build: Option<BuildTicket>,
}

/// 会话整体状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreviewStatus {
    Idle,
    Loading,
    Ready,
    Empty,
    /// 压缩包处理失败
    Failed { message: String },
    /// 下载失败，预览区保持为空
    FetchFailed { message: String },
}

enum SessionContent {
    Idle,
    Loading,
    Single(SingleFile),
    Archive,
    FetchFailed(String),
}

/// 资源预览会话
pub struct ResourcePreview {
    loader: PreviewLoader,
    store: ObjectStore,
    options: RenderOptions,
    navigator: ArchiveNavigator,
    resource: Option<ResourceMetadata>,
    content: SessionContent,
    generation: u64,
}

impl ResourcePreview {
    pub fn new(client: Arc<dyn ResourceClient>, config: &PreviewConfig) -> Self {
        let store = ObjectStore::new();
        Self {
            loader: PreviewLoader::new(client, store.clone(), config),
            store,
            options: RenderOptions::from(config),
            navigator: ArchiveNavigator::new(SplitBounds::from(config)),
            resource: None,
            content: SessionContent::Idle,
            generation: 0,
        }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn loader(&self) -> PreviewLoader {
        self.loader.clone()
    }

    pub fn resource(&self) -> Option<&ResourceMetadata> {
        self.resource.as_ref()
    }

    pub fn navigator(&self) -> &ArchiveNavigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut ArchiveNavigator {
        &mut self.navigator
    }

    /// 开始打开资源：释放之前的内容并进入 Loading
    pub fn begin_open(&mut self, resource: ResourceMetadata) -> OpenTicket {
        self.close();
        self.generation += 1;

        let build = match resource.classification().category {
            ContentCategory::Archive => Some(self.navigator.begin_build()),
            _ => None,
        };
        self.resource = Some(resource);
        self.content = SessionContent::Loading;

        OpenTicket {
            generation: self.generation,
            build,
        }
    }

    /// 提交加载结果；票据过期时丢弃结果并释放其引用
    pub fn finish_open(
        &mut self,
        ticket: OpenTicket,
        result: Result<LoadedContent, PreviewError>,
    ) -> bool {
        if ticket.generation != self.generation {
            log::warn!("丢弃过期的预览结果 (generation {})", ticket.generation);
            return false;
        }

        match (result, ticket.build) {
            (Ok(LoadedContent::Archive(tree)), Some(build)) => {
                self.navigator.complete_build(build, Ok(tree));
                self.content = SessionContent::Archive;
            }
            (Err(PreviewError::Archive(e)), Some(build)) => {
                self.navigator.complete_build(build, Err(e));
                self.content = SessionContent::Archive;
            }
            (Ok(LoadedContent::Single(file)), _) => {
                self.content = SessionContent::Single(file);
            }
            (Ok(LoadedContent::Archive(_)), None) => {
                log::warn!("未预期的压缩包结果，已丢弃");
                self.content = SessionContent::Idle;
            }
            (Err(e), _) => {
                log::error!("资源预览失败: {}", e);
                self.navigator.close();
                self.content = SessionContent::FetchFailed(e.user_message().to_string());
            }
        }
        true
    }

    /// 下载并打开资源
    pub async fn open(&mut self, resource: ResourceMetadata) -> PreviewStatus {
        let ticket = self.begin_open(resource.clone());
        let result = self.loader.load(&resource).await;
        self.finish_open(ticket, result);
        self.status()
    }

    pub fn status(&self) -> PreviewStatus {
        match &self.content {
            SessionContent::Idle => PreviewStatus::Idle,
            SessionContent::Loading => PreviewStatus::Loading,
            SessionContent::Single(_) => PreviewStatus::Ready,
            SessionContent::FetchFailed(message) => PreviewStatus::FetchFailed {
                message: message.clone(),
            },
            SessionContent::Archive => match self.navigator.phase() {
                PreviewPhase::Idle => PreviewStatus::Idle,
                PreviewPhase::Loading => PreviewStatus::Loading,
                PreviewPhase::Ready => PreviewStatus::Ready,
                PreviewPhase::Empty => PreviewStatus::Empty,
                PreviewPhase::Failed { message } => PreviewStatus::Failed {
                    message: message.clone(),
                },
            },
        }
    }

    pub fn single_file(&self) -> Option<&SingleFile> {
        match &self.content {
            SessionContent::Single(file) => Some(file),
            _ => None,
        }
    }

    /// 内容面板当前的展示；没有可展示内容时返回 None
    pub fn presentation(&self) -> Option<Presentation> {
        match &self.content {
            SessionContent::Loading => Some(Presentation::Loading),
            SessionContent::Single(file) => Some(render::render(
                file.classification.category,
                file.payload(),
                &self.options,
            )),
            SessionContent::Archive => {
                let entry = self.navigator.selected_entry()?;
                let payload = RenderPayload {
                    file_name: &entry.name,
                    url: entry.object_ref.as_ref().map(ObjectRef::url),
                    text: entry.inline_text.as_deref(),
                    grammar: entry.grammar,
                };
                Some(render::render(entry.category, payload, &self.options))
            }
            SessionContent::Idle | SessionContent::FetchFailed(_) => None,
        }
    }

    /// 按 blob URL 取回数据，供媒体元素加载；引用释放后返回 None
    pub fn object_data(&self, url: &str) -> Option<Bytes> {
        self.store.resolve_url(url)
    }

    /// 资源描述（Markdown）
    pub fn description(&self) -> Option<Presentation> {
        let resource = self.resource.as_ref()?;
        if resource.description.trim().is_empty() {
            return None;
        }
        Some(render::render_description(&resource.description, &self.options))
    }

    /// 关闭预览并释放全部对象引用
    pub fn close(&mut self) {
        self.generation += 1;
        self.navigator.close();
        self.content = SessionContent::Idle;
        self.resource = None;
    }
}

impl Drop for ResourcePreview {
    fn drop(&mut self) {
        self.close();
    }
}
