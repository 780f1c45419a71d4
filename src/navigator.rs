// 压缩包树导航 / 分栏查看器状态
// 左侧目录树，右侧内容面板，中间可拖动分隔条

use crate::archive::{ArchiveEntry, ArchiveError, ArchiveTree};
use crate::classify::ContentCategory;
use crate::config::PreviewConfig;
use serde::Serialize;
use std::collections::HashSet;

/// 导航器所处阶段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum PreviewPhase {
    /// 尚未开始或已关闭
    Idle,
    /// 正在解压
    Loading,
    /// 树已构建并选中了文件
    Ready,
    /// 树已构建但没有任何文件
    Empty,
    /// 解压失败，只能重新构建
    Failed { message: String },
}

/// 每个预览对话框的视图状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourcePreviewState {
    pub selected_entry_path: Option<String>,
    pub expanded_paths: HashSet<String>,
    pub split_ratio: f32,
}

/// 分隔条比例范围
///
/// 构造时规范化：上下限颠倒时互换，非有限值退回默认范围，默认值收进范围内。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitBounds {
    min: f32,
    max: f32,
    default: f32,
}

impl SplitBounds {
    const MIN: f32 = 0.10;
    const MAX: f32 = 0.50;
    const DEFAULT: f32 = 0.25;

    pub fn new(min: f32, max: f32, default: f32) -> Self {
        if !min.is_finite() || !max.is_finite() {
            log::warn!("分栏比例范围无效 ({}..{})，使用默认范围", min, max);
            return Self::default();
        }

        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let default = if default.is_finite() {
            default.max(min).min(max)
        } else {
            min
        };
        Self { min, max, default }
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn default_ratio(&self) -> f32 {
        self.default
    }

    pub fn clamp(&self, ratio: f32) -> f32 {
        if ratio.is_nan() {
            return self.default;
        }
        ratio.max(self.min).min(self.max)
    }
}

impl Default for SplitBounds {
    fn default() -> Self {
        Self {
            min: Self::MIN,
            max: Self::MAX,
            default: Self::DEFAULT,
        }
    }
}

impl From<&PreviewConfig> for SplitBounds {
    fn from(config: &PreviewConfig) -> Self {
        Self::new(
            config.split_ratio_min,
            config.split_ratio_max,
            config.split_ratio_default,
        )
    }
}

/// 构建票据，用于识别过期的构建结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTicket {
    generation: u64,
}

/// 目录树中可见的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeRow {
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub is_directory: bool,
    pub is_expanded: bool,
    pub is_selected: bool,
    pub category: ContentCategory,
}

/// 压缩包导航器
pub struct ArchiveNavigator {
    phase: PreviewPhase,
    tree: Option<ArchiveTree>,
    state: ResourcePreviewState,
    bounds: SplitBounds,
    generation: u64,
}

impl ArchiveNavigator {
    pub fn new(bounds: SplitBounds) -> Self {
        Self {
            phase: PreviewPhase::Idle,
            tree: None,
            state: ResourcePreviewState {
                selected_entry_path: None,
                expanded_paths: HashSet::new(),
                split_ratio: bounds.default,
            },
            bounds,
            generation: 0,
        }
    }

    pub fn phase(&self) -> &PreviewPhase {
        &self.phase
    }

    pub fn state(&self) -> &ResourcePreviewState {
        &self.state
    }

    pub fn tree(&self) -> Option<&ArchiveTree> {
        self.tree.as_ref()
    }

    /// 开始新的构建，之前的树与未完成的构建全部作废
    pub fn begin_build(&mut self) -> BuildTicket {
        self.discard_tree();
        self.generation += 1;
        self.phase = PreviewPhase::Loading;
        BuildTicket {
            generation: self.generation,
        }
    }

    /// 提交构建结果
    ///
    /// 票据过期时丢弃结果（树在 drop 时释放引用）并返回 false。
    pub fn complete_build(
        &mut self,
        ticket: BuildTicket,
        result: Result<ArchiveTree, ArchiveError>,
    ) -> bool {
        if ticket.generation != self.generation || self.phase != PreviewPhase::Loading {
            log::warn!("丢弃过期的压缩包构建结果 (generation {})", ticket.generation);
            return false;
        }

        match result {
            Ok(tree) => {
                let first = tree.first_file().map(|entry| entry.path.clone());
                match first {
                    Some(path) => {
                        self.state.expanded_paths.extend(ancestors(&path));
                        self.state.selected_entry_path = Some(path);
                        self.phase = PreviewPhase::Ready;
                    }
                    None => {
                        self.phase = PreviewPhase::Empty;
                    }
                }
                self.tree = Some(tree);
            }
            Err(e) => {
                log::error!("压缩包处理失败: {}", e);
                self.phase = PreviewPhase::Failed {
                    message: e.user_message().to_string(),
                };
            }
        }
        true
    }

    /// 展开或折叠目录，只修改 expanded_paths
    pub fn toggle_directory(&mut self, path: &str) -> bool {
        let is_directory = self
            .tree
            .as_ref()
            .and_then(|tree| tree.find(path))
            .map(|entry| entry.is_directory)
            .unwrap_or(false);
        if !is_directory {
            return false;
        }

        if !self.state.expanded_paths.remove(path) {
            self.state.expanded_paths.insert(path.to_string());
        }
        true
    }

    /// 选中文件，只修改 selected_entry_path
    pub fn select_file(&mut self, path: &str) -> bool {
        if self.phase != PreviewPhase::Ready {
            return false;
        }
        let is_file = self
            .tree
            .as_ref()
            .and_then(|tree| tree.find(path))
            .map(ArchiveEntry::is_file)
            .unwrap_or(false);
        if !is_file {
            return false;
        }

        self.state.selected_entry_path = Some(path.to_string());
        true
    }

    /// 直接设置分栏比例（会被限制在范围内）
    pub fn set_split_ratio(&mut self, ratio: f32) -> f32 {
        self.state.split_ratio = self.bounds.clamp(ratio);
        self.state.split_ratio
    }

    /// 拖动分隔条：根据指针在容器内的偏移计算比例
    pub fn drag_divider(&mut self, offset: f32, container_width: f32) -> f32 {
        if container_width <= 0.0 {
            return self.state.split_ratio;
        }
        self.set_split_ratio(offset / container_width)
    }

    pub fn selected_entry(&self) -> Option<&ArchiveEntry> {
        let path = self.state.selected_entry_path.as_deref()?;
        self.tree.as_ref()?.find(path)
    }

    /// 展平后的可见行（折叠目录的子节点不出现）
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        if let Some(tree) = &self.tree {
            for entry in tree.roots() {
                self.flatten(entry, 0, &mut rows);
            }
        }
        rows
    }

    fn flatten(&self, entry: &ArchiveEntry, depth: usize, rows: &mut Vec<TreeRow>) {
        let is_expanded = entry.is_directory && self.state.expanded_paths.contains(&entry.path);
        rows.push(TreeRow {
            path: entry.path.clone(),
            name: entry.name.clone(),
            depth,
            is_directory: entry.is_directory,
            is_expanded,
            is_selected: self.state.selected_entry_path.as_deref() == Some(entry.path.as_str()),
            category: entry.category,
        });

        if is_expanded {
            for child in &entry.children {
                self.flatten(child, depth + 1, rows);
            }
        }
    }

    /// 关闭预览：释放树并作废进行中的构建
    pub fn close(&mut self) {
        self.discard_tree();
        self.generation += 1;
        self.phase = PreviewPhase::Idle;
    }

    fn discard_tree(&mut self) {
        if let Some(mut tree) = self.tree.take() {
            tree.dispose();
        }
        self.state.selected_entry_path = None;
        self.state.expanded_paths.clear();
    }
}

impl Default for ArchiveNavigator {
    fn default() -> Self {
        Self::new(SplitBounds::default())
    }
}

/// 路径的所有祖先目录，例如 a/b/c.txt -> [a, a/b]
fn ancestors(path: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = path;
    while let Some((parent, _)) = current.rsplit_once('/') {
        result.push(parent.to_string());
        current = parent;
    }
    result.reverse();
    result
}
