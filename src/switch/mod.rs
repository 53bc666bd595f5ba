//! 断点组切换
//!
//! 被调试程序在上下文之间切换时（如内核 => 用户程序），让后端清除旧组断点、
//! 卸载旧符号表、加载新符号表并重新设置新组断点。切换本身是同步的：
//! 请求全部派发后立即更新当前组名，不等待后端完成。

mod dispatch;

pub use dispatch::{DispatchHandle, DispatchReport, Job, RequestFailure};
pub(crate) use dispatch::Dispatcher;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::backend::{BreakpointRequest, PathMapper};
use crate::group::{BreakpointGroup, GroupRegistry};
use crate::policy::ContextPolicy;

/// 切换协调器，持有当前组名
pub struct SwitchCoordinator {
    current: String,
    policy: Arc<dyn ContextPolicy>,
    /// 远程会话时把本地路径转换为后端路径
    remote_paths: Option<Arc<dyn PathMapper>>,
    dispatcher: Dispatcher,
}

impl SwitchCoordinator {
    pub(crate) fn new(
        current: impl Into<String>,
        policy: Arc<dyn ContextPolicy>,
        remote_paths: Option<Arc<dyn PathMapper>>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            current: current.into(),
            policy,
            remote_paths,
            dispatcher,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// 切换到目标组；目标与当前相同时也完整执行一遍
    pub fn switch_to(&mut self, registry: &mut GroupRegistry, target: &str) -> DispatchHandle {
        let jobs = self.plan(registry, target);
        debug!(from = %self.current, to = target, jobs = jobs.len(), "派发切换请求");
        let handle = self.dispatcher.dispatch(jobs);
        info!(from = %self.current, to = target, "断点组切换");
        self.current = target.to_string();
        handle
    }

    /// 生成切换所需的请求，必要时创建目标组与当前组
    pub fn plan(&self, registry: &mut GroupRegistry, target: &str) -> Vec<Job> {
        registry.ensure_group(target);
        registry.ensure_group(&self.current);
        let (Some(old), Some(new)) = (registry.find(&self.current), registry.find(target)) else {
            return Vec::new();
        };

        let mut jobs = file_jobs(old, new, |path| self.backend_path(path));
        jobs.push(Job::Symbols {
            unload: self.policy.files_for_context(old.name()),
            load: self.policy.files_for_context(new.name()),
        });
        jobs
    }

    /// 只清除后端中当前组的断点，缓存保持不变
    pub fn disable_current(&self, registry: &GroupRegistry) -> Option<(Vec<String>, DispatchHandle)> {
        let group = registry.find(&self.current)?;
        let paths: Vec<String> = group
            .file_breakpoints()
            .iter()
            .map(|spec| spec.path.clone())
            .collect();
        let jobs = paths
            .iter()
            .map(|path| Job::File {
                path: path.clone(),
                clear_old: true,
                reload: None,
            })
            .collect();
        Some((paths, self.dispatcher.dispatch(jobs)))
    }

    fn backend_path(&self, local_path: &str) -> String {
        match &self.remote_paths {
            Some(mapper) => mapper.to_remote_path(local_path),
            None => local_path.to_string(),
        }
    }
}

/// 每个涉及的源文件一个任务；同时出现在新旧两组中的文件合并为一个顺序任务
fn file_jobs(
    old: &BreakpointGroup,
    new: &BreakpointGroup,
    backend_path: impl Fn(&str) -> String,
) -> Vec<Job> {
    let mut jobs: Vec<Job> = Vec::new();
    let mut by_path: FxHashMap<&str, usize> = FxHashMap::default();

    for spec in old.file_breakpoints() {
        by_path.insert(spec.path.as_str(), jobs.len());
        jobs.push(Job::File {
            path: spec.path.clone(),
            clear_old: true,
            reload: None,
        });
    }

    for spec in new.file_breakpoints() {
        let file = backend_path(&spec.path);
        let requests: Vec<BreakpointRequest> = spec
            .breakpoints
            .iter()
            .map(|bp| BreakpointRequest::from_source(file.clone(), bp))
            .collect();
        match by_path.get(spec.path.as_str()) {
            Some(&idx) => {
                if let Job::File { reload, .. } = &mut jobs[idx] {
                    *reload = Some(requests);
                }
            }
            None => jobs.push(Job::File {
                path: spec.path.clone(),
                clear_old: false,
                reload: Some(requests),
            }),
        }
    }
    jobs
}
