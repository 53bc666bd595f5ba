//! 外部协作者接口：调试器后端、路径映射与用户通知

mod mi_log;
#[cfg(test)]
pub(crate) mod testing;

pub use mi_log::MiLogBackend;

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::group::SourceBreakpoint;

/// 向调试器后端添加断点的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointRequest {
    /// 后端可寻址的文件路径（远程会话下已转换）
    pub file: String,
    pub line: u32,
    pub condition: Option<String>,
    pub hit_condition: Option<String>,
    pub log_message: Option<String>,
}

impl BreakpointRequest {
    pub fn from_source(file: impl Into<String>, breakpoint: &SourceBreakpoint) -> Self {
        Self {
            file: file.into(),
            line: breakpoint.line,
            condition: breakpoint.condition.clone(),
            hit_condition: breakpoint.hit_condition.clone(),
            log_message: breakpoint.log_message.clone(),
        }
    }
}

/// 发往后端的一次请求，用于日志和失败汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRequest {
    ClearBreakpoints { path: String },
    AddBreakpoint(BreakpointRequest),
    LoadSymbolFile { path: String },
    UnloadSymbolFile { path: String },
}

impl BackendRequest {
    /// 请求涉及的文件路径
    pub fn path(&self) -> &str {
        match self {
            Self::ClearBreakpoints { path }
            | Self::LoadSymbolFile { path }
            | Self::UnloadSymbolFile { path } => path,
            Self::AddBreakpoint(request) => &request.file,
        }
    }
}

impl std::fmt::Display for BackendRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClearBreakpoints { path } => write!(f, "clear-breakpoints {}", path),
            Self::AddBreakpoint(request) => {
                write!(f, "add-breakpoint {}:{}", request.file, request.line)
            }
            Self::LoadSymbolFile { path } => write!(f, "load-symbol-file {}", path),
            Self::UnloadSymbolFile { path } => write!(f, "unload-symbol-file {}", path),
        }
    }
}

/// 调试器后端
///
/// 每个方法对应一条独立的异步请求，失败时返回错误，由调用方决定如何处理。
#[async_trait]
pub trait DebuggerBackend: Send + Sync {
    /// 移除某个文件上的全部断点
    async fn clear_breakpoints(&self, path: &str) -> Result<()>;

    async fn add_breakpoint(&self, request: BreakpointRequest) -> Result<()>;

    /// 加载符号表文件
    async fn load_symbol_file(&self, path: &str) -> Result<()>;

    /// 卸载符号表文件
    async fn unload_symbol_file(&self, path: &str) -> Result<()>;
}

/// 本地路径到远程路径的转换，只在远程会话中使用
pub trait PathMapper: Send + Sync {
    fn to_remote_path(&self, local_path: &str) -> String;
}

/// 按目录前缀替换的源码路径映射
#[derive(Debug, Clone)]
pub struct SourceFileMap {
    local: PathBuf,
    remote: String,
}

impl SourceFileMap {
    pub fn new(local: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            remote: remote.into(),
        }
    }
}

impl PathMapper for SourceFileMap {
    fn to_remote_path(&self, local_path: &str) -> String {
        let Ok(relative) = Path::new(local_path).strip_prefix(&self.local) else {
            // 不在映射目录下，原样交给后端
            return local_path.to_string();
        };
        let mut remote = self.remote.trim_end_matches('/').to_string();
        for component in relative.components() {
            remote.push('/');
            remote.push_str(&component.as_os_str().to_string_lossy());
        }
        remote
    }
}

/// 面向用户的提示信息
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// 把提示信息写入日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        info!(target: "bpgroups::notify", "{}", message);
    }
}
