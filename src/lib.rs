//! 多镜像调试会话的断点组管理
//!
//! 同一个调试目标会在多个符号空间之间切换（例如 rCore 的内核与各个用户程序）。
//! 每个空间对应一个断点组；切换时由 [`GroupManager`] 驱动调试器后端
//! 换下旧组的断点与符号表、换上新组的。

pub mod backend;
pub mod const_values;
pub mod group;
pub mod manager;
pub mod policy;
pub mod script;
pub mod switch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

pub use backend::{DebuggerBackend, MiLogBackend, Notifier, PathMapper, TracingNotifier};
pub use const_values::SessionConfig;
pub use group::{BreakpointGroup, FileBreakpoints, GroupRegistry};
pub use manager::{Collaborators, GroupManager};
pub use policy::ContextPolicy;
pub use switch::{DispatchHandle, DispatchReport};

/// 断点组会话回放工具
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 会话配置文件
    #[arg(short, long, default_value = "profile/session.toml")]
    pub config: PathBuf,

    /// 会话脚本
    #[arg(short, long)]
    pub script: PathBuf,

    /// 结束时输出发给后端的全部 MI 命令
    #[arg(long, default_value_t = false)]
    pub transcript: bool,
}

pub fn build_session_run_blocking(args: Args) -> Result<()> {
    let config = SessionConfig::new(&args.config)?;
    let script = std::fs::read_to_string(&args.script)
        .with_context(|| format!("无法读取会话脚本: {:?}", args.script.as_os_str()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("无法创建异步运行时")?;

    let backend = Arc::new(match config.path_mapper() {
        Some(map) => MiLogBackend::with_path_map(Arc::new(map)),
        None => MiLogBackend::new(),
    });
    let mut manager = GroupManager::from_config(
        &config,
        backend.clone(),
        Arc::new(TracingNotifier),
        runtime.handle().clone(),
    )?;
    info!(
        initial = manager.current_group_name(),
        remote = config.session.remote,
        contexts = config.contexts.len(),
        "会话已建立"
    );

    let summary = runtime
        .block_on(script::run_script(&mut manager, &script))
        .with_context(|| format!("会话脚本执行失败: {:?}", args.script.as_os_str()))?;
    info!(
        commands = summary.commands,
        switches = summary.switches,
        backend_failures = summary.backend_failures,
        "脚本执行完毕"
    );
    script::list_groups(&manager);

    if args.transcript {
        info!("MI 命令记录:\n{}", backend.transcript().join("\n"));
    }
    Ok(())
}
