//! 断点组注册表

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{BreakpointGroup, FileBreakpoints};

/// 按名字索引的断点组集合，保持插入顺序
///
/// 组只能通过 [`GroupRegistry::ensure_group`]、[`GroupRegistry::save_breakpoints`]
/// 或 [`GroupRegistry::insert_if_absent`] 创建，因此名字始终唯一。
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<BreakpointGroup>,
    /// 组名 -> groups 下标
    index: FxHashMap<String, usize>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取断点组，不存在时创建空组
    pub fn ensure_group(&mut self, name: &str) -> &mut BreakpointGroup {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => self.push(BreakpointGroup::new(name)),
        };
        &mut self.groups[idx]
    }

    /// 插入新组；同名组已存在时保留原组
    pub fn insert_if_absent(&mut self, group: BreakpointGroup) -> &mut BreakpointGroup {
        let idx = match self.index.get(group.name()) {
            Some(&idx) => idx,
            None => self.push(group),
        };
        &mut self.groups[idx]
    }

    pub fn find(&self, name: &str) -> Option<&BreakpointGroup> {
        self.index.get(name).map(|&idx| &self.groups[idx])
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut BreakpointGroup> {
        self.index.get(name).map(|&idx| &mut self.groups[idx])
    }

    /// 缓存某个文件的断点到指定组，不通知调试器后端
    pub fn save_breakpoints(&mut self, spec: FileBreakpoints, group_name: &str) {
        let path = spec.path.clone();
        let replaced = self.ensure_group(group_name).save_file_breakpoints(spec);
        debug!(group = group_name, path = %path, replaced, "缓存文件断点");
    }

    /// 按插入顺序列出全部组
    pub fn list_all(&self) -> &[BreakpointGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 丢弃全部断点组
    pub fn reset(&mut self) {
        self.groups.clear();
        self.index.clear();
    }

    fn push(&mut self, group: BreakpointGroup) -> usize {
        let idx = self.groups.len();
        debug!(group = group.name(), "创建断点组");
        self.index.insert(group.name().to_string(), idx);
        self.groups.push(group);
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{Border, BorderSet};

    #[test]
    fn test_ensure_then_find_returns_empty_group() {
        let mut registry = GroupRegistry::new();
        for name in ["kernel", "user/src/bin/initproc.rs", ""] {
            registry.ensure_group(name);
            let group = registry.find(name).expect("group should exist");
            assert_eq!(group.name(), name);
            assert!(group.file_breakpoints().is_empty());
            assert!(group.hooks().is_empty());
            assert_eq!(group.borders().map(BorderSet::len), Some(0));
        }
    }

    #[test]
    fn test_ensure_grows_at_most_one() {
        let mut registry = GroupRegistry::new();
        registry.ensure_group("kernel");
        registry.ensure_group("kernel");
        assert_eq!(registry.len(), 1);
        registry.ensure_group("user");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_find_does_not_create() {
        let registry = GroupRegistry::new();
        assert!(registry.find("kernel").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_save_is_idempotent_per_path() {
        let mut registry = GroupRegistry::new();
        let spec = FileBreakpoints::from_lines("/src/k.c", &[10]);
        registry.save_breakpoints(spec.clone(), "kernel");
        registry.save_breakpoints(spec.clone(), "kernel");
        registry.save_breakpoints(spec, "kernel");

        let group = registry.find("kernel").unwrap();
        assert_eq!(group.file_breakpoints().len(), 1);
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let mut registry = GroupRegistry::new();
        registry.ensure_group("c");
        registry.save_breakpoints(FileBreakpoints::from_lines("/a.rs", &[1]), "a");
        registry.insert_if_absent(BreakpointGroup::with_border("b", Border::new("/b.rs", 2)));

        let names: Vec<_> = registry.list_all().iter().map(|g| g.name()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_insert_if_absent_keeps_existing() {
        let mut registry = GroupRegistry::new();
        registry.save_breakpoints(FileBreakpoints::from_lines("/a.rs", &[1]), "a");
        registry.insert_if_absent(BreakpointGroup::new("a"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find("a").unwrap().file_breakpoints().len(), 1);
    }

    #[test]
    fn test_reset_discards_groups() {
        let mut registry = GroupRegistry::new();
        registry.ensure_group("kernel");
        registry.ensure_group("user");
        registry.reset();
        assert!(registry.find("kernel").is_none());
        assert!(registry.is_empty());

        // 重置后可以重新创建
        registry.ensure_group("kernel");
        assert_eq!(registry.list_all().len(), 1);
    }
}
