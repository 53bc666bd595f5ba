//! 钩子断点

use serde::Serialize;

/// 断点位置：文件 + 行号
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BreakpointLocation {
    pub file: String,
    pub line: u32,
}

impl BreakpointLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for BreakpointLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// 用户定义的钩子行为
///
/// 只作为数据保存，由宿主会话在断点命中时解释；这里从不执行其中的内容。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookBehavior {
    pub function_arguments: String,
    pub function_body: String,
    pub is_async: bool,
}

/// 带钩子行为的断点
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookBreakpoint {
    #[serde(rename = "breakpoint")]
    pub location: BreakpointLocation,
    pub behavior: HookBehavior,
}

impl HookBreakpoint {
    pub fn new(location: BreakpointLocation, behavior: HookBehavior) -> Self {
        Self { location, behavior }
    }
}

/// 钩子表，按位置唯一
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HookTable {
    hooks: Vec<HookBreakpoint>,
}

impl HookTable {
    /// 设置钩子：同位置替换（后写者胜），否则插入。返回被替换的旧钩子
    pub fn set(&mut self, hook: HookBreakpoint) -> Option<HookBreakpoint> {
        match self.hooks.iter_mut().find(|h| h.location == hook.location) {
            Some(existing) => Some(std::mem::replace(existing, hook)),
            None => {
                self.hooks.push(hook);
                None
            }
        }
    }

    /// 移除某位置的钩子
    pub fn remove(&mut self, location: &BreakpointLocation) -> Option<HookBreakpoint> {
        let index = self.hooks.iter().position(|h| &h.location == location)?;
        Some(self.hooks.remove(index))
    }

    pub fn get(&self, location: &BreakpointLocation) -> Option<&HookBreakpoint> {
        self.hooks.iter().find(|h| &h.location == location)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HookBreakpoint> {
        self.hooks.iter()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hook(line: u32, body: &str) -> HookBreakpoint {
        HookBreakpoint::new(
            BreakpointLocation::new("/src/k.c", line),
            HookBehavior {
                function_body: body.to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_set_replaces_same_location() {
        let mut table = HookTable::default();
        assert!(table.set(hook(10, "first")).is_none());
        let old = table.set(hook(10, "second"));

        assert_eq!(old.map(|h| h.behavior.function_body), Some("first".to_string()));
        assert_eq!(table.len(), 1);
        let current = table.get(&BreakpointLocation::new("/src/k.c", 10));
        assert_eq!(current.map(|h| h.behavior.function_body.as_str()), Some("second"));
    }

    #[test]
    fn test_remove() {
        let mut table = HookTable::default();
        table.set(hook(1, "a"));
        table.set(hook(2, "b"));

        assert!(table.remove(&BreakpointLocation::new("/src/k.c", 1)).is_some());
        assert!(table.remove(&BreakpointLocation::new("/src/k.c", 1)).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_serializes_as_list() {
        let mut table = HookTable::default();
        table.set(hook(7, "log()"));
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"functionBody\":\"log()\""));
        assert!(json.contains("\"line\":7"));
    }
}
