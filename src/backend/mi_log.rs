//! 演练用后端：把请求翻译成 GDB/MI 命令文本并记录，不连接真实调试器

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use super::{BreakpointRequest, DebuggerBackend, PathMapper};

#[derive(Debug, Default)]
struct MiState {
    /// 下一个断点编号，GDB 从 1 开始
    next_number: u32,
    /// 后端路径 -> 已插入的断点编号
    numbers: FxHashMap<String, Vec<u32>>,
    transcript: Vec<String>,
}

/// 记录 MI 命令的后端
///
/// 清除请求带的是本地路径，添加请求带的是远程路径；
/// 远程会话需要同一个路径映射，才能找到要删除的断点。
#[derive(Default)]
pub struct MiLogBackend {
    state: Mutex<MiState>,
    remote_paths: Option<Arc<dyn PathMapper>>,
}

impl MiLogBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 远程会话使用的后端
    pub fn with_path_map(mapper: Arc<dyn PathMapper>) -> Self {
        Self {
            state: Mutex::default(),
            remote_paths: Some(mapper),
        }
    }

    /// 已发出的全部命令
    pub fn transcript(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.transcript.clone())
            .unwrap_or_default()
    }

    fn emit(state: &mut MiState, command: String) {
        info!(command = %command, "MI");
        state.transcript.push(command);
    }

    /// 统一为后端路径；已经是远程路径时映射不改变它
    fn backend_path(&self, path: &str) -> String {
        match &self.remote_paths {
            Some(mapper) => mapper.to_remote_path(path),
            None => path.to_string(),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MiState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("MI 后端状态锁已损坏"))
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// 只支持纯数字的命中次数，对应 GDB 的忽略次数
fn ignore_count(hit_condition: &str) -> Option<u32> {
    let count: u32 = hit_condition.trim().trim_start_matches(">=").trim().parse().ok()?;
    Some(count.saturating_sub(1))
}

#[async_trait]
impl DebuggerBackend for MiLogBackend {
    async fn clear_breakpoints(&self, path: &str) -> Result<()> {
        let key = self.backend_path(path);
        let mut state = self.lock()?;
        let numbers = state.numbers.remove(&key).unwrap_or_default();
        if numbers.is_empty() {
            debug!(path, "文件上没有断点，跳过删除");
            return Ok(());
        }
        let ids: Vec<String> = numbers.iter().map(u32::to_string).collect();
        Self::emit(&mut state, format!("-break-delete {}", ids.join(" ")));
        Ok(())
    }

    async fn add_breakpoint(&self, request: BreakpointRequest) -> Result<()> {
        let mut state = self.lock()?;
        state.next_number += 1;
        let number = state.next_number;
        let location = format!("{}:{}", request.file, request.line);

        let command = match &request.log_message {
            Some(message) => format!("-dprintf-insert {} {}", location, quote(message)),
            None => {
                let mut command = String::from("-break-insert -f");
                if let Some(condition) = &request.condition {
                    command += &format!(" -c {}", quote(condition));
                }
                if let Some(hit_condition) = &request.hit_condition {
                    match ignore_count(hit_condition) {
                        Some(count) => command += &format!(" -i {}", count),
                        None => warn!(
                            hit_condition = %hit_condition,
                            location = %location,
                            "命中次数条件不是数字，已忽略"
                        ),
                    }
                }
                command + " " + &location
            }
        };
        Self::emit(&mut state, command);
        let key = self.backend_path(&request.file);
        state.numbers.entry(key).or_default().push(number);
        Ok(())
    }

    async fn load_symbol_file(&self, path: &str) -> Result<()> {
        let mut state = self.lock()?;
        Self::emit(
            &mut state,
            format!("-interpreter-exec console {}", quote(&format!("add-symbol-file {}", path))),
        );
        Ok(())
    }

    async fn unload_symbol_file(&self, path: &str) -> Result<()> {
        let mut state = self.lock()?;
        Self::emit(
            &mut state,
            format!("-interpreter-exec console {}", quote(&format!("remove-symbol-file {}", path))),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SourceFileMap;

    fn request(line: u32) -> BreakpointRequest {
        BreakpointRequest {
            file: "/src/k.c".to_string(),
            line,
            condition: None,
            hit_condition: None,
            log_message: None,
        }
    }

    #[tokio::test]
    async fn test_insert_then_delete_by_file() {
        let backend = MiLogBackend::new();
        backend.add_breakpoint(request(10)).await.unwrap();
        backend
            .add_breakpoint(BreakpointRequest {
                condition: Some("x == 1".to_string()),
                hit_condition: Some("3".to_string()),
                ..request(12)
            })
            .await
            .unwrap();
        backend.clear_breakpoints("/src/k.c").await.unwrap();
        // 第二次删除时已经没有断点
        backend.clear_breakpoints("/src/k.c").await.unwrap();

        assert_eq!(
            backend.transcript(),
            [
                "-break-insert -f /src/k.c:10",
                "-break-insert -f -c \"x == 1\" -i 2 /src/k.c:12",
                "-break-delete 1 2",
            ]
        );
    }

    #[tokio::test]
    async fn test_remote_clear_by_local_path() {
        let mapper = Arc::new(SourceFileMap::new("/home/me/rCore", "/root/rCore"));
        let backend = MiLogBackend::with_path_map(mapper);
        backend
            .add_breakpoint(BreakpointRequest {
                file: "/root/rCore/os/src/main.rs".to_string(),
                ..request(42)
            })
            .await
            .unwrap();
        backend
            .clear_breakpoints("/home/me/rCore/os/src/main.rs")
            .await
            .unwrap();

        assert_eq!(
            backend.transcript(),
            ["-break-insert -f /root/rCore/os/src/main.rs:42", "-break-delete 1"]
        );
    }

    #[tokio::test]
    async fn test_non_numeric_hit_condition_ignored() {
        let backend = MiLogBackend::new();
        backend
            .add_breakpoint(BreakpointRequest {
                hit_condition: Some("% 2".to_string()),
                ..request(5)
            })
            .await
            .unwrap();
        assert_eq!(backend.transcript(), ["-break-insert -f /src/k.c:5"]);
    }

    #[tokio::test]
    async fn test_log_message_becomes_dprintf() {
        let backend = MiLogBackend::new();
        backend
            .add_breakpoint(BreakpointRequest {
                log_message: Some("hit".to_string()),
                ..request(3)
            })
            .await
            .unwrap();
        assert_eq!(backend.transcript(), ["-dprintf-insert /src/k.c:3 \"hit\""]);
    }

    #[tokio::test]
    async fn test_symbol_files() {
        let backend = MiLogBackend::new();
        backend.unload_symbol_file("/bin/os").await.unwrap();
        backend.load_symbol_file("/bin/initproc").await.unwrap();
        assert_eq!(
            backend.transcript(),
            [
                "-interpreter-exec console \"remove-symbol-file /bin/os\"",
                "-interpreter-exec console \"add-symbol-file /bin/initproc\"",
            ]
        );
    }
}
