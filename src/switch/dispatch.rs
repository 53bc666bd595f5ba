//! 后端请求的派发
//!
//! 所有后端请求都经过这里：每个任务在运行时上独立执行，失败被记录并吸收，
//! 不影响其他文件的处理。调用方可以丢弃返回的句柄（不等待），
//! 也可以等待句柄拿到汇总的失败列表。

use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::backend::{BackendRequest, BreakpointRequest, DebuggerBackend};

/// 一条失败的后端请求
#[derive(Debug, Error)]
#[error("后端请求 `{request}` 失败: {source}")]
pub struct RequestFailure {
    pub request: BackendRequest,
    #[source]
    pub source: anyhow::Error,
}

/// 派发单元，同一单元内的请求按顺序执行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// 同一源文件上的请求：先清除旧组断点，再清除并重新添加新组断点
    File {
        path: String,
        clear_old: bool,
        /// `None` 表示该文件不在新组中
        reload: Option<Vec<BreakpointRequest>>,
    },
    /// 先卸载旧上下文的符号表，再加载新上下文的符号表
    Symbols { unload: Vec<String>, load: Vec<String> },
}

/// 已派发请求的句柄
///
/// 丢弃句柄不会取消请求。
#[derive(Debug, Default)]
pub struct DispatchHandle {
    tasks: Vec<JoinHandle<Vec<RequestFailure>>>,
}

impl DispatchHandle {
    /// 派发的任务数
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 等待全部请求结束，汇总失败
    pub async fn settled(self) -> DispatchReport {
        let mut failures = Vec::new();
        for task in self.tasks {
            match task.await {
                Ok(mut task_failures) => failures.append(&mut task_failures),
                Err(e) => warn!(error = %e, "后端请求任务异常终止"),
            }
        }
        DispatchReport { failures }
    }
}

/// 一批请求的结果
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub failures: Vec<RequestFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone)]
pub(crate) struct Dispatcher {
    backend: Arc<dyn DebuggerBackend>,
    runtime: Handle,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn DebuggerBackend>, runtime: Handle) -> Self {
        Self { backend, runtime }
    }

    /// 每个单元一个任务，立即返回
    pub fn dispatch(&self, jobs: Vec<Job>) -> DispatchHandle {
        let tasks = jobs
            .into_iter()
            .map(|job| {
                let backend = self.backend.clone();
                self.runtime.spawn(run_job(backend, job))
            })
            .collect();
        DispatchHandle { tasks }
    }
}

async fn run_job(backend: Arc<dyn DebuggerBackend>, job: Job) -> Vec<RequestFailure> {
    let mut failures = Vec::new();
    match job {
        Job::File {
            path,
            clear_old,
            reload,
        } => {
            let clear = || BackendRequest::ClearBreakpoints { path: path.clone() };
            if clear_old {
                record(issue(backend.as_ref(), clear()).await, &mut failures);
            }
            if let Some(breakpoints) = reload {
                match issue(backend.as_ref(), clear()).await {
                    Ok(()) => failures.extend(add_all(&backend, breakpoints).await),
                    // 清除未确认，不再重新添加
                    Err(failure) => failures.push(failure),
                }
            }
        }
        Job::Symbols { unload, load } => {
            for path in unload {
                let request = BackendRequest::UnloadSymbolFile { path };
                record(issue(backend.as_ref(), request).await, &mut failures);
            }
            for path in load {
                let request = BackendRequest::LoadSymbolFile { path };
                record(issue(backend.as_ref(), request).await, &mut failures);
            }
        }
    }
    failures
}

/// 同一文件内的断点并发添加
async fn add_all(
    backend: &Arc<dyn DebuggerBackend>,
    breakpoints: Vec<BreakpointRequest>,
) -> Vec<RequestFailure> {
    let mut adds = JoinSet::new();
    for breakpoint in breakpoints {
        let backend = backend.clone();
        adds.spawn(async move {
            issue(backend.as_ref(), BackendRequest::AddBreakpoint(breakpoint)).await
        });
    }
    let mut failures = Vec::new();
    while let Some(joined) = adds.join_next().await {
        match joined {
            Ok(result) => record(result, &mut failures),
            Err(e) => warn!(error = %e, "添加断点任务异常终止"),
        }
    }
    failures
}

async fn issue(backend: &dyn DebuggerBackend, request: BackendRequest) -> Result<(), RequestFailure> {
    debug!(request = %request, "发出后端请求");
    let result = match &request {
        BackendRequest::ClearBreakpoints { path } => backend.clear_breakpoints(path).await,
        BackendRequest::AddBreakpoint(breakpoint) => {
            backend.add_breakpoint(breakpoint.clone()).await
        }
        BackendRequest::LoadSymbolFile { path } => backend.load_symbol_file(path).await,
        BackendRequest::UnloadSymbolFile { path } => backend.unload_symbol_file(path).await,
    };
    result.map_err(|source| {
        warn!(request = %request, error = %source, "后端请求失败，已忽略");
        RequestFailure { request, source }
    })
}

fn record(result: Result<(), RequestFailure>, failures: &mut Vec<RequestFailure>) {
    if let Err(failure) = result {
        failures.push(failure);
    }
}
