//! 测试用的记录型协作者

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use rustc_hash::FxHashSet;

use super::{BackendRequest, BreakpointRequest, DebuggerBackend, Notifier};

/// 记录每条请求；可以让指定路径上的请求失败，或为每条请求加延迟
#[derive(Default)]
pub(crate) struct RecordingBackend {
    calls: Mutex<Vec<BackendRequest>>,
    failing: Mutex<FxHashSet<String>>,
    delay: Option<Duration>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn fail_path(&self, path: &str) {
        self.failing.lock().unwrap().insert(path.to_string());
    }

    pub fn calls(&self) -> Vec<BackendRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// 某路径上的请求，按完成顺序
    pub fn calls_for(&self, path: &str) -> Vec<BackendRequest> {
        self.calls()
            .into_iter()
            .filter(|call| call.path() == path)
            .collect()
    }

    async fn record(&self, request: BackendRequest) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self.failing.lock().unwrap().contains(request.path());
        let path = request.path().to_string();
        self.calls.lock().unwrap().push(request);
        if failing {
            bail!("injected failure for {}", path);
        }
        Ok(())
    }
}

#[async_trait]
impl DebuggerBackend for RecordingBackend {
    async fn clear_breakpoints(&self, path: &str) -> Result<()> {
        self.record(BackendRequest::ClearBreakpoints {
            path: path.to_string(),
        })
        .await
    }

    async fn add_breakpoint(&self, request: BreakpointRequest) -> Result<()> {
        self.record(BackendRequest::AddBreakpoint(request)).await
    }

    async fn load_symbol_file(&self, path: &str) -> Result<()> {
        self.record(BackendRequest::LoadSymbolFile {
            path: path.to_string(),
        })
        .await
    }

    async fn unload_symbol_file(&self, path: &str) -> Result<()> {
        self.record(BackendRequest::UnloadSymbolFile {
            path: path.to_string(),
        })
        .await
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
