/// ZIP 压缩包树构建器
use crate::archive::error::{ArchiveError, EntryDecodeError};
use crate::archive::types::*;
use crate::blob::ObjectStore;
use crate::classify::classify;
use bytes::Bytes;
use futures::future::join_all;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

type ZipReader = ZipArchive<Cursor<Bytes>>;

/// 压缩包中列出的原始条目
#[derive(Debug, Clone)]
struct RawEntry {
    index: usize,
    segments: Vec<String>,
    is_dir: bool,
    size: u64,
}

/// 第一遍遍历生成的节点草稿
#[derive(Debug)]
struct DraftNode {
    name: String,
    path: String,
    file: Option<(usize, u64)>,
    children: Vec<usize>,
}

/// 树骨架：目录去重、文件按遍历顺序占位
#[derive(Debug, Default)]
struct TreeSkeleton {
    nodes: Vec<DraftNode>,
    roots: Vec<usize>,
    by_path: HashMap<String, usize>,
}

impl TreeSkeleton {
    fn link(&mut self, parent: Option<usize>, node: usize) {
        match parent {
            Some(parent) => self.nodes[parent].children.push(node),
            None => self.roots.push(node),
        }
    }

    /// 确保目录节点存在，路径已被文件占用时返回 None
    fn ensure_directory(&mut self, path: &str, name: &str, parent: Option<usize>) -> Option<usize> {
        if let Some(&existing) = self.by_path.get(path) {
            return match self.nodes[existing].file {
                None => Some(existing),
                Some(_) => None,
            };
        }

        let node = self.nodes.len();
        self.nodes.push(DraftNode {
            name: name.to_string(),
            path: path.to_string(),
            file: None,
            children: Vec::new(),
        });
        self.by_path.insert(path.to_string(), node);
        self.link(parent, node);
        Some(node)
    }

    fn insert(&mut self, entry: &RawEntry) {
        let dir_depth = if entry.is_dir {
            entry.segments.len()
        } else {
            entry.segments.len() - 1
        };

        let mut parent = None;
        let mut path = String::new();
        for segment in &entry.segments[..dir_depth] {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);

            match self.ensure_directory(&path, segment, parent) {
                Some(node) => parent = Some(node),
                None => {
                    log::warn!("路径 {} 已是文件，跳过条目 {}", path, entry.index);
                    return;
                }
            }
        }

        if entry.is_dir {
            return;
        }

        let name = &entry.segments[dir_depth];
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(name);

        if self.by_path.contains_key(&path) {
            log::warn!("重复的压缩包条目 {}，保留第一次出现的节点", path);
            return;
        }

        let node = self.nodes.len();
        self.nodes.push(DraftNode {
            name: name.clone(),
            path: path.clone(),
            file: Some((entry.index, entry.size)),
            children: Vec::new(),
        });
        self.by_path.insert(path, node);
        self.link(parent, node);
    }

    /// 所有文件占位：(节点序号, 条目索引)
    fn file_slots(&self) -> Vec<(usize, usize)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(node, draft)| draft.file.map(|(index, _)| (node, index)))
            .collect()
    }
}

/// 已解压的文件数据
struct FilePayload {
    data: Bytes,
}

/// 默认允许解压出的总字节数
pub const DEFAULT_MAX_UNCOMPRESSED_BYTES: u64 = 512 * 1024 * 1024;

/// ZIP 压缩包树构建器
#[derive(Clone)]
pub struct ZipTreeBuilder {
    store: ObjectStore,
    max_uncompressed_bytes: u64,
}

impl ZipTreeBuilder {
    pub fn new(store: ObjectStore) -> Self {
        Self {
            store,
            max_uncompressed_bytes: DEFAULT_MAX_UNCOMPRESSED_BYTES,
        }
    }

    /// 设置解压总量上限（单个条目与全部条目之和都不能超过）
    pub fn with_max_uncompressed_bytes(mut self, limit: u64) -> Self {
        self.max_uncompressed_bytes = limit;
        self
    }

    /// 解压整个压缩包并构建条目树
    ///
    /// 所有条目解压完成后才返回；容器本身无效时整体失败，不会产生任何对象引用。
    pub async fn build(&self, data: Bytes) -> Result<ArchiveTree, ArchiveError> {
        let compressed_size = data.len() as u64;
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        let entries = Self::list_entries(&mut archive);
        log::debug!("ZIP 条目数量: {}", entries.len());
        self.check_declared_sizes(&entries)?;

        let mut skeleton = TreeSkeleton::default();
        for entry in &entries {
            skeleton.insert(entry);
        }

        // 第二遍：并发解压所有文件条目
        let limit = self.max_uncompressed_bytes;
        let slots = skeleton.file_slots();
        let tasks = slots.iter().map(|&(_, index)| {
            let mut archive = archive.clone();
            tokio::task::spawn_blocking(move || Self::read_entry(&mut archive, index, limit))
        });
        let results = join_all(tasks).await;

        let mut payloads: HashMap<usize, FilePayload> = HashMap::with_capacity(slots.len());
        let mut expanded: u64 = 0;
        for (&(node, _), result) in slots.iter().zip(results) {
            match result {
                Ok(Ok(data)) => {
                    expanded = expanded.saturating_add(data.len() as u64);
                    payloads.insert(node, FilePayload { data });
                }
                Ok(Err(EntryDecodeError::TooLarge { path, read, limit })) => {
                    log::warn!("条目 {} 解压后超过 {} 字节", path, limit);
                    return Err(ArchiveError::TooLarge { size: read, limit });
                }
                Ok(Err(e)) => log::warn!("{}", e),
                Err(e) => log::warn!("解压任务失败 {}: {}", skeleton.nodes[node].path, e),
            }
        }
        // 条目头声明的大小可能不实
        if expanded > limit {
            return Err(ArchiveError::TooLarge {
                size: expanded,
                limit,
            });
        }

        let mut stats = ArchiveStats {
            total_compressed_size: compressed_size,
            ..ArchiveStats::default()
        };
        let roots = self.materialize(skeleton, payloads, &mut stats);

        log::debug!(
            "压缩包树构建完成: {} 个文件, {} 个目录",
            stats.file_count,
            stats.directory_count
        );

        Ok(ArchiveTree::new(roots, stats, self.store.clone()))
    }

    /// 枚举条目路径，读取失败的条目跳过
    fn list_entries(archive: &mut ZipReader) -> Vec<RawEntry> {
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            match archive.by_index_raw(index) {
                Ok(file) => {
                    let segments = split_path(file.name());
                    if segments.is_empty() {
                        continue;
                    }
                    entries.push(RawEntry {
                        index,
                        segments,
                        is_dir: file.is_dir(),
                        size: file.size(),
                    });
                }
                Err(e) => {
                    log::warn!("读取 ZIP 条目 {} 失败: {}", index, e);
                    continue;
                }
            }
        }

        entries
    }

    /// 按条目头声明的大小检查解压总量，超出上限时不解压任何条目
    fn check_declared_sizes(&self, entries: &[RawEntry]) -> Result<(), ArchiveError> {
        let limit = self.max_uncompressed_bytes;
        let mut total: u64 = 0;

        for entry in entries.iter().filter(|entry| !entry.is_dir) {
            if entry.size > limit {
                return Err(ArchiveError::TooLarge {
                    size: entry.size,
                    limit,
                });
            }
            total = total.saturating_add(entry.size);
        }

        if total > limit {
            return Err(ArchiveError::TooLarge { size: total, limit });
        }
        Ok(())
    }

    fn read_entry(
        archive: &mut ZipReader,
        index: usize,
        limit: u64,
    ) -> Result<Bytes, EntryDecodeError> {
        let file = archive.by_index(index).map_err(|e| EntryDecodeError::Read {
            path: format!("#{}", index),
            reason: e.to_string(),
        })?;
        let path = file.name().to_string();

        let capacity = usize::try_from(file.size().min(limit)).unwrap_or(0);
        let mut buffer = Vec::with_capacity(capacity);
        file.take(limit.saturating_add(1))
            .read_to_end(&mut buffer)
            .map_err(|e| EntryDecodeError::Read {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let read = buffer.len() as u64;
        if read > limit {
            return Err(EntryDecodeError::TooLarge { path, read, limit });
        }
        Ok(Bytes::from(buffer))
    }

    /// 将骨架转换为最终的条目树，同时为文件分配对象引用
    fn materialize(
        &self,
        skeleton: TreeSkeleton,
        mut payloads: HashMap<usize, FilePayload>,
        stats: &mut ArchiveStats,
    ) -> Vec<ArchiveEntry> {
        let TreeSkeleton { nodes, roots, .. } = skeleton;
        let mut slots: Vec<Option<DraftNode>> = nodes.into_iter().map(Some).collect();

        roots
            .into_iter()
            .filter_map(|root| self.materialize_node(root, &mut slots, &mut payloads, stats))
            .collect()
    }

    fn materialize_node(
        &self,
        node: usize,
        slots: &mut [Option<DraftNode>],
        payloads: &mut HashMap<usize, FilePayload>,
        stats: &mut ArchiveStats,
    ) -> Option<ArchiveEntry> {
        let draft = slots.get_mut(node)?.take()?;

        let Some((_, size)) = draft.file else {
            stats.directory_count += 1;
            let mut entry = ArchiveEntry::directory(draft.name, draft.path);
            entry.children = draft
                .children
                .into_iter()
                .filter_map(|child| self.materialize_node(child, slots, payloads, stats))
                .collect();
            return Some(entry);
        };

        stats.file_count += 1;
        stats.total_uncompressed_size += size;

        let classification = classify(&draft.name, None);
        let category = classification.category.for_entry();
        let mut entry = ArchiveEntry {
            name: draft.name,
            path: draft.path,
            is_directory: false,
            category,
            grammar: classification.grammar,
            size,
            object_ref: None,
            inline_text: None,
            children: Vec::new(),
        };

        if let Some(payload) = payloads.remove(&node) {
            if category.is_text_like() {
                match decode_text(&entry.path, &payload.data) {
                    Ok(text) => entry.inline_text = Some(text),
                    Err(e) => log::debug!("{}，仅保留对象引用", e),
                }
            }
            entry.object_ref = Some(self.store.acquire(payload.data));
        }

        Some(entry)
    }
}

/// 拆分条目路径，忽略空段与 "."
fn split_path(raw: &str) -> Vec<String> {
    raw.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(str::to_string)
        .collect()
}

/// 严格按 UTF-8 解码文本条目
pub(crate) fn decode_text(path: &str, data: &[u8]) -> Result<String, EntryDecodeError> {
    std::str::from_utf8(data)
        .map(str::to_string)
        .map_err(|_| EntryDecodeError::NotUtf8 {
            path: path.to_string(),
        })
}
