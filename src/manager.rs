//! 断点组管理器：调试会话使用的统一入口

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::backend::{DebuggerBackend, Notifier, PathMapper};
use crate::const_values::{ConfigError, SessionConfig};
use crate::group::{
    Border, BreakpointGroup, BreakpointLocation, FileBreakpoints, GroupRegistry, HookBreakpoint,
};
use crate::policy::{ContextPolicy, TablePolicy};
use crate::switch::{DispatchHandle, Dispatcher, SwitchCoordinator};

/// 管理器依赖的外部协作者
#[derive(Clone)]
pub struct Collaborators {
    pub backend: Arc<dyn DebuggerBackend>,
    pub policy: Arc<dyn ContextPolicy>,
    pub notifier: Arc<dyn Notifier>,
    /// 远程会话的路径映射，`None` 表示本地会话
    pub remote_paths: Option<Arc<dyn PathMapper>>,
}

/// 断点组管理器
///
/// 每个调试会话一个实例。所有修改都通过 `&mut self` 顺序进行，
/// 只有切换时发出的后端请求是异步的。
pub struct GroupManager {
    registry: GroupRegistry,
    coordinator: SwitchCoordinator,
    /// 下一次切换的预期目标，只是提示
    next_group: String,
    policy: Arc<dyn ContextPolicy>,
    notifier: Arc<dyn Notifier>,
}

impl GroupManager {
    /// 创建管理器，初始当前组立即建立
    pub fn new(
        initial_group: &str,
        next_group: &str,
        collaborators: Collaborators,
        runtime: Handle,
    ) -> Self {
        let Collaborators {
            backend,
            policy,
            notifier,
            remote_paths,
        } = collaborators;
        let mut registry = GroupRegistry::new();
        registry.ensure_group(initial_group);
        let dispatcher = Dispatcher::new(backend, runtime);
        Self {
            registry,
            coordinator: SwitchCoordinator::new(
                initial_group,
                policy.clone(),
                remote_paths,
                dispatcher,
            ),
            next_group: next_group.to_string(),
            policy,
            notifier,
        }
    }

    /// 按会话配置创建：上下文表策略，远程会话使用配置的路径映射
    pub fn from_config(
        config: &SessionConfig,
        backend: Arc<dyn DebuggerBackend>,
        notifier: Arc<dyn Notifier>,
        runtime: Handle,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let remote_paths = config
            .path_mapper()
            .map(|map| Arc::new(map) as Arc<dyn PathMapper>);
        let collaborators = Collaborators {
            backend,
            policy: Arc::new(TablePolicy::from_config(config)),
            notifier,
            remote_paths,
        };
        Ok(Self::new(
            &config.session.initial_group,
            config.next_group(),
            collaborators,
            runtime,
        ))
    }

    /// 切换当前断点组，返回已派发请求的句柄
    pub fn switch_to(&mut self, target: &str) -> DispatchHandle {
        let handle = self.coordinator.switch_to(&mut self.registry, target);
        self.notifier
            .notify(&format!("breakpoint group changed to {}", target));
        handle
    }

    /// 缓存断点，不立即让后端设置
    pub fn save_breakpoints(&mut self, spec: FileBreakpoints, group_name: &str) {
        self.registry.save_breakpoints(spec, group_name);
    }

    /// 在所属的每个组中设置钩子
    pub fn set_hook(&mut self, hook: HookBreakpoint) {
        for name in self.policy.contexts_for_file(&hook.location.file) {
            if let Some(group) = self.registry.find_mut(&name) {
                group.hooks_mut().set(hook.clone());
                let hooks = serde_json::to_string(group.hooks()).unwrap_or_default();
                self.notifier.notify(&format!("hooks set {}", hooks));
            } else {
                self.registry
                    .insert_if_absent(BreakpointGroup::with_hook(name.as_str(), hook.clone()));
            }
            debug!(group = %name, location = %hook.location, "设置钩子");
        }
    }

    /// 移除钩子行为，断点本身保留
    pub fn clear_hook(&mut self, location: &BreakpointLocation) {
        for name in self.policy.contexts_for_file(&location.file) {
            if let Some(group) = self.registry.find_mut(&name) {
                let removed = group.hooks_mut().remove(location).is_some();
                debug!(group = %name, location = %location, removed, "移除钩子");
            }
        }
    }

    /// 在所属的每个组中追加边界
    pub fn set_border(&mut self, border: Border) {
        for name in self.policy.contexts_for_file(&border.file) {
            if let Some(group) = self.registry.find_mut(&name) {
                group.add_border(border.clone());
            } else {
                self.registry
                    .insert_if_absent(BreakpointGroup::with_border(name.as_str(), border.clone()));
            }
            debug!(group = %name, file = %border.file, line = border.line, "设置边界");
        }
    }

    /// 清除所属组的全部边界，而不只是传入的这一个
    pub fn clear_border(&mut self, border: &Border) {
        for name in self.policy.contexts_for_file(&border.file) {
            if let Some(group) = self.registry.find_mut(&name) {
                group.clear_borders();
                debug!(group = %name, "清除边界");
            }
        }
    }

    /// 让后端清除当前组的断点，缓存保持不变
    pub fn disable_current_group_breakpoints(&mut self) -> DispatchHandle {
        let Some((paths, handle)) = self.coordinator.disable_current(&self.registry) else {
            return DispatchHandle::default();
        };
        for path in &paths {
            self.notifier.notify(&format!(
                "breakpoints of group {} cleared in {}",
                self.coordinator.current(),
                path
            ));
        }
        handle
    }

    /// 丢弃全部断点组；当前组名与下一个组名保持不变
    pub fn reset(&mut self) {
        info!(groups = self.registry.len(), "重置断点组");
        self.registry.reset();
    }

    pub fn current_group_name(&self) -> &str {
        self.coordinator.current()
    }

    /// 当前组，可能尚未创建
    pub fn current_group(&self) -> Option<&BreakpointGroup> {
        self.registry.find(self.coordinator.current())
    }

    pub fn next_group_name(&self) -> &str {
        &self.next_group
    }

    pub fn set_next_group_name(&mut self, name: impl Into<String>) {
        self.next_group = name.into();
    }

    pub fn group(&self, name: &str) -> Option<&BreakpointGroup> {
        self.registry.find(name)
    }

    pub fn groups(&self) -> &[BreakpointGroup] {
        self.registry.list_all()
    }
}
