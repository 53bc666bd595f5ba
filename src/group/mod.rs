//! 断点组数据实体
//!
//! 一个断点组对应调试目标的一个逻辑执行上下文（例如内核镜像、某个用户程序），
//! 缓存该上下文下用户设置的源码断点、钩子断点与边界断点。

mod borders;
mod hooks;
mod registry;

pub use borders::{Border, BorderSet};
pub use hooks::{BreakpointLocation, HookBehavior, HookBreakpoint, HookTable};
pub use registry::GroupRegistry;

/// 单个源码断点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBreakpoint {
    /// 行号
    pub line: u32,
    /// 条件表达式
    pub condition: Option<String>,
    /// 命中次数条件
    pub hit_condition: Option<String>,
    /// 日志断点的输出内容
    pub log_message: Option<String>,
}

impl SourceBreakpoint {
    pub fn at_line(line: u32) -> Self {
        Self {
            line,
            condition: None,
            hit_condition: None,
            log_message: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// 一个源文件上的全部断点，整体替换
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBreakpoints {
    /// 源文件路径（本地路径）
    pub path: String,
    pub breakpoints: Vec<SourceBreakpoint>,
}

impl FileBreakpoints {
    pub fn new(path: impl Into<String>, breakpoints: Vec<SourceBreakpoint>) -> Self {
        Self {
            path: path.into(),
            breakpoints,
        }
    }

    /// 仅由行号构造
    pub fn from_lines(path: impl Into<String>, lines: &[u32]) -> Self {
        Self::new(
            path,
            lines.iter().copied().map(SourceBreakpoint::at_line).collect(),
        )
    }
}

/// 断点组
#[derive(Debug, Clone)]
pub struct BreakpointGroup {
    /// 组名，同时是查找键
    name: String,
    file_breakpoints: Vec<FileBreakpoints>,
    /// `None` 表示从未配置边界，`Some(空集)` 表示边界已被显式清除
    borders: Option<BorderSet>,
    hooks: HookTable,
}

impl BreakpointGroup {
    /// 创建空断点组（边界集合为空集）
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_breakpoints: Vec::new(),
            borders: Some(BorderSet::default()),
            hooks: HookTable::default(),
        }
    }

    /// 仅包含一个钩子的新组，边界未配置
    pub fn with_hook(name: impl Into<String>, hook: HookBreakpoint) -> Self {
        let mut hooks = HookTable::default();
        hooks.set(hook);
        Self {
            name: name.into(),
            file_breakpoints: Vec::new(),
            borders: None,
            hooks,
        }
    }

    /// 仅包含一个边界的新组
    pub fn with_border(name: impl Into<String>, border: Border) -> Self {
        let mut borders = BorderSet::default();
        borders.push(border);
        Self {
            name: name.into(),
            file_breakpoints: Vec::new(),
            borders: Some(borders),
            hooks: HookTable::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_breakpoints(&self) -> &[FileBreakpoints] {
        &self.file_breakpoints
    }

    pub fn borders(&self) -> Option<&BorderSet> {
        self.borders.as_ref()
    }

    pub fn hooks(&self) -> &HookTable {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookTable {
        &mut self.hooks
    }

    /// 是否没有任何缓存内容
    pub fn is_empty(&self) -> bool {
        self.file_breakpoints.is_empty()
            && self.hooks.is_empty()
            && self.borders.as_ref().is_none_or(BorderSet::is_empty)
    }

    /// 保存某个文件的断点：同路径则原位替换，否则追加。返回是否发生替换
    pub fn save_file_breakpoints(&mut self, spec: FileBreakpoints) -> bool {
        match self
            .file_breakpoints
            .iter_mut()
            .find(|existing| existing.path == spec.path)
        {
            Some(existing) => {
                *existing = spec;
                true
            }
            None => {
                self.file_breakpoints.push(spec);
                false
            }
        }
    }

    /// 追加边界；未配置过边界时先建立集合
    pub fn add_border(&mut self, border: Border) {
        self.borders
            .get_or_insert_with(BorderSet::default)
            .push(border);
    }

    /// 清除全部边界（不只是某一个）
    pub fn clear_borders(&mut self) {
        self.borders = Some(BorderSet::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_group_is_empty() {
        let group = BreakpointGroup::new("kernel");
        assert_eq!(group.name(), "kernel");
        assert!(group.file_breakpoints().is_empty());
        assert!(group.hooks().is_empty());
        assert_eq!(group.borders().map(BorderSet::len), Some(0));
        assert!(group.is_empty());
    }

    #[test]
    fn test_save_replaces_same_path() {
        let mut group = BreakpointGroup::new("kernel");
        assert!(!group.save_file_breakpoints(FileBreakpoints::from_lines("/src/k.c", &[10])));
        assert!(!group.save_file_breakpoints(FileBreakpoints::from_lines("/src/m.c", &[3])));
        assert!(group.save_file_breakpoints(FileBreakpoints::from_lines("/src/k.c", &[11, 12])));

        let files = group.file_breakpoints();
        assert_eq!(files.len(), 2);
        // 原位替换，顺序不变
        assert_eq!(files[0].path, "/src/k.c");
        assert_eq!(files[0].breakpoints.len(), 2);
        assert_eq!(files[1].path, "/src/m.c");
    }

    #[test]
    fn test_hook_group_has_unset_borders() {
        let hook = HookBreakpoint::new(BreakpointLocation::new("/src/k.c", 5), HookBehavior::default());
        let mut group = BreakpointGroup::with_hook("kernel", hook);
        assert!(group.borders().is_none());
        assert_eq!(group.hooks().len(), 1);

        group.add_border(Border::new("/src/k.c", 5));
        assert_eq!(group.borders().map(BorderSet::len), Some(1));
    }

    #[test]
    fn test_clear_borders_leaves_empty_set() {
        let mut group = BreakpointGroup::with_border("kernel", Border::new("/src/k.c", 1));
        group.add_border(Border::new("/src/k.c", 2));
        group.clear_borders();
        assert_eq!(group.borders().map(BorderSet::len), Some(0));
    }
}
