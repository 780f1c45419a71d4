pub mod archive; // 压缩包解压与目录树
pub mod blob; // 对象引用注册表
pub mod classify; // 文件分类
pub mod config;
pub mod navigator; // 分栏查看器状态
pub mod preview; // 预览会话
pub mod render; // 内容渲染
pub mod resource; // 资源元数据与下载

pub use archive::{ArchiveEntry, ArchiveError, ArchiveStats, ArchiveTree, ZipTreeBuilder};
pub use blob::{ObjectRef, ObjectStore};
pub use classify::{classify, Classification, ContentCategory, ResourceKind};
pub use config::{ConfigError, PreviewConfig};
pub use navigator::{ArchiveNavigator, PreviewPhase, ResourcePreviewState, TreeRow};
pub use preview::{PreviewError, PreviewStatus, ResourcePreview};
pub use render::{Presentation, RenderOptions};
pub use resource::{FetchError, HttpResourceClient, ResourceClient, ResourceMetadata};
