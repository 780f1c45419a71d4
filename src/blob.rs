// 对象引用生命周期管理
// 为每段可预览的字节数据分配可撤销的本地引用（blob: URL）

use crate::archive::types::ArchiveEntry;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

const BLOB_URL_PREFIX: &str = "blob:emsi-share/";

/// 本地对象引用
///
/// 每次 acquire 都会得到新的句柄；句柄不可克隆，由创建它的树节点独占。
#[derive(PartialEq, Eq, Hash)]
pub struct ObjectRef {
    id: Uuid,
    len: usize,
}

impl ObjectRef {
    /// 供媒体元素 src 使用的 URL
    pub fn url(&self) -> String {
        format!("{}{}", BLOB_URL_PREFIX, self.id)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({}, {} bytes)", self.id, self.len)
    }
}

/// 对象引用仓库
///
/// 克隆后共享同一份存储，可在多个任务间传递。
#[derive(Clone, Default)]
pub struct ObjectStore {
    objects: Arc<Mutex<HashMap<Uuid, Bytes>>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Bytes>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 登记一段字节数据并返回新的引用
    pub fn acquire(&self, data: Bytes) -> ObjectRef {
        let id = Uuid::new_v4();
        let len = data.len();
        self.lock().insert(id, data);
        ObjectRef { id, len }
    }

    /// 释放引用；重复释放或释放未知引用都是空操作
    pub fn release(&self, object: &ObjectRef) -> bool {
        self.lock().remove(&object.id).is_some()
    }

    /// 读取引用对应的数据，释放后返回 None
    pub fn resolve(&self, object: &ObjectRef) -> Option<Bytes> {
        self.lock().get(&object.id).cloned()
    }

    /// 按 blob URL 读取数据
    pub fn resolve_url(&self, url: &str) -> Option<Bytes> {
        let id = url.strip_prefix(BLOB_URL_PREFIX)?;
        let id = Uuid::parse_str(id).ok()?;
        self.lock().get(&id).cloned()
    }

    pub fn is_live(&self, object: &ObjectRef) -> bool {
        self.lock().contains_key(&object.id)
    }

    /// 当前未释放的引用数量
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    /// 遍历整棵条目树，释放所有引用，返回实际释放的数量
    pub fn release_tree(&self, entries: &[ArchiveEntry]) -> usize {
        let mut objects = self.lock();
        let mut released = 0;
        let mut stack: Vec<&ArchiveEntry> = entries.iter().collect();

        while let Some(entry) = stack.pop() {
            if let Some(object) = &entry.object_ref {
                if objects.remove(&object.id).is_some() {
                    released += 1;
                }
            }
            stack.extend(entry.children.iter());
        }

        released
    }
}

impl fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStore")
            .field("live", &self.live_count())
            .finish()
    }
}
