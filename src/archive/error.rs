/// 压缩包处理错误
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Invalid archive: {0}")]
    Decompression(#[from] zip::result::ZipError),

    #[error("Archive too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

impl ArchiveError {
    /// 预览面板中展示的唯一错误信息
    pub fn user_message(&self) -> &'static str {
        match self {
            ArchiveError::Decompression(_) => "Failed to process archive",
            ArchiveError::TooLarge { .. } => "Archive is too large to preview",
        }
    }
}

/// 单个条目的解码错误，只在内部使用
#[derive(Debug, thiserror::Error)]
pub enum EntryDecodeError {
    #[error("Failed to read entry {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Entry {path} is not valid UTF-8")]
    NotUtf8 { path: String },

    #[error("Entry {path} expands past {limit} bytes")]
    TooLarge { path: String, read: u64, limit: u64 },
}
