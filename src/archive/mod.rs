// 压缩包处理
// 在内存中解压 ZIP 并重建目录层级

pub mod builder;
pub mod error;
pub mod types;

pub use builder::{ZipTreeBuilder, DEFAULT_MAX_UNCOMPRESSED_BYTES};
pub use error::{ArchiveError, EntryDecodeError};
pub use types::{ArchiveEntry, ArchiveStats, ArchiveTree};
