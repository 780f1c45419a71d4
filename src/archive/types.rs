use crate::blob::{ObjectRef, ObjectStore};
use crate::classify::ContentCategory;
use serde::Serialize;

/// 压缩包树中的节点
#[derive(Debug, Serialize)]
pub struct ArchiveEntry {
    /// 显示名称（路径最后一段）
    pub name: String,
    /// 从压缩包根开始的完整路径，以 / 分隔
    pub path: String,
    pub is_directory: bool,
    pub category: ContentCategory,
    /// 代码文件的高亮语法
    pub grammar: Option<&'static str>,
    /// 解压后的大小（目录为 0）
    pub size: u64,
    /// 文件数据的本地引用，仅文件节点持有
    #[serde(skip)]
    pub object_ref: Option<ObjectRef>,
    /// 文本类文件预先解码的内容
    #[serde(skip)]
    pub inline_text: Option<String>,
    pub children: Vec<ArchiveEntry>,
}

impl ArchiveEntry {
    pub fn directory(name: String, path: String) -> Self {
        Self {
            name,
            path,
            is_directory: true,
            category: ContentCategory::Unknown,
            grammar: None,
            size: 0,
            object_ref: None,
            inline_text: None,
            children: Vec::new(),
        }
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory
    }

    /// 父目录路径，根节点返回 None
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(parent, _)| parent)
    }

    /// 深度优先（按插入顺序）查找第一个文件
    pub fn first_file(&self) -> Option<&ArchiveEntry> {
        if self.is_file() {
            return Some(self);
        }
        self.children.iter().find_map(ArchiveEntry::first_file)
    }

    pub fn find(&self, path: &str) -> Option<&ArchiveEntry> {
        if self.path == path {
            return Some(self);
        }
        if !self.is_directory || !path.starts_with(self.path.as_str()) {
            return None;
        }
        self.children.iter().find_map(|child| child.find(path))
    }
}

/// 压缩包统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveStats {
    pub file_count: usize,
    pub directory_count: usize,
    pub total_uncompressed_size: u64,
    pub total_compressed_size: u64,
}

/// 解压后的压缩包树
///
/// 持有树中所有对象引用；`dispose` 或 drop 时统一释放。
pub struct ArchiveTree {
    roots: Vec<ArchiveEntry>,
    stats: ArchiveStats,
    store: ObjectStore,
    disposed: bool,
}

impl ArchiveTree {
    pub(crate) fn new(roots: Vec<ArchiveEntry>, stats: ArchiveStats, store: ObjectStore) -> Self {
        Self {
            roots,
            stats,
            store,
            disposed: false,
        }
    }

    pub fn roots(&self) -> &[ArchiveEntry] {
        &self.roots
    }

    pub fn stats(&self) -> &ArchiveStats {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn first_file(&self) -> Option<&ArchiveEntry> {
        self.roots.iter().find_map(ArchiveEntry::first_file)
    }

    pub fn find(&self, path: &str) -> Option<&ArchiveEntry> {
        self.roots.iter().find_map(|root| root.find(path))
    }

    /// 按深度优先顺序遍历所有节点
    pub fn walk(&self) -> Vec<&ArchiveEntry> {
        let mut out = Vec::new();
        let mut stack: Vec<&ArchiveEntry> = self.roots.iter().rev().collect();
        while let Some(entry) = stack.pop() {
            out.push(entry);
            stack.extend(entry.children.iter().rev());
        }
        out
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// 释放树中的全部对象引用，可重复调用
    pub fn dispose(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        self.disposed = true;
        let released = self.store.release_tree(&self.roots);
        log::debug!("压缩包树已释放 {} 个对象引用", released);
        released
    }
}

impl Drop for ArchiveTree {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ArchiveTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveTree")
            .field("roots", &self.roots.len())
            .field("stats", &self.stats)
            .field("disposed", &self.disposed)
            .finish()
    }
}
