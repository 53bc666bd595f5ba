//! 会话脚本
//!
//! 按行回放调试会话中的事件（保存断点、切换断点组、钩子与边界的设置），
//! 便于脱离 IDE 检查断点组的行为。`#` 开头的行是注释。

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::group::{
    Border, BreakpointLocation, FileBreakpoints, HookBehavior, HookBreakpoint, SourceBreakpoint,
};
use crate::manager::GroupManager;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("未知命令 `{0}`")]
    UnknownCommand(String),
    #[error("缺少参数: {0}")]
    MissingArgument(&'static str),
    #[error("无效的行号 `{0}`")]
    InvalidLine(String),
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("第 {line} 行: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },
}

/// 脚本命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// save <group> <path> <line>[:<condition>] ...
    Save { group: String, spec: FileBreakpoints },
    /// switch <group>
    Switch(String),
    /// next <group>
    Next(String),
    /// hook <path> <line> [body...]
    Hook(HookBreakpoint),
    /// unhook <path> <line>
    Unhook(BreakpointLocation),
    /// border <path> <line>
    Border(Border),
    /// unborder <path> <line>
    Unborder(Border),
    /// disable
    Disable,
    /// reset
    Reset,
    /// list
    List,
    Empty,
}

/// 解析一行
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(Command::Empty);
    }

    let mut words = line.split_whitespace();
    let cmd = words.next().unwrap_or("");
    let command = match cmd {
        "save" => {
            let group = word(&mut words, "group")?;
            let path = word(&mut words, "path")?;
            let breakpoints = words
                .map(parse_breakpoint)
                .collect::<Result<Vec<_>, _>>()?;
            Command::Save {
                group,
                spec: FileBreakpoints::new(path, breakpoints),
            }
        }
        "switch" => Command::Switch(word(&mut words, "group")?),
        "next" => Command::Next(word(&mut words, "group")?),
        "hook" => {
            let location = location(&mut words)?;
            let body: Vec<&str> = words.collect();
            Command::Hook(HookBreakpoint::new(
                location,
                HookBehavior {
                    function_body: body.join(" "),
                    ..Default::default()
                },
            ))
        }
        "unhook" => Command::Unhook(location(&mut words)?),
        "border" => {
            let at = location(&mut words)?;
            Command::Border(Border::new(at.file, at.line))
        }
        "unborder" => {
            let at = location(&mut words)?;
            Command::Unborder(Border::new(at.file, at.line))
        }
        "disable" => Command::Disable,
        "reset" => Command::Reset,
        "list" => Command::List,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

fn word<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    what: &'static str,
) -> Result<String, ParseError> {
    words
        .next()
        .map(str::to_string)
        .ok_or(ParseError::MissingArgument(what))
}

fn line_number(text: &str) -> Result<u32, ParseError> {
    text.parse()
        .map_err(|_| ParseError::InvalidLine(text.to_string()))
}

fn location<'a>(
    words: &mut impl Iterator<Item = &'a str>,
) -> Result<BreakpointLocation, ParseError> {
    let file = word(words, "path")?;
    let line = line_number(&word(words, "line")?)?;
    Ok(BreakpointLocation::new(file, line))
}

/// `10` 或 `10:cond`
fn parse_breakpoint(text: &str) -> Result<SourceBreakpoint, ParseError> {
    match text.split_once(':') {
        Some((line, condition)) => {
            Ok(SourceBreakpoint::at_line(line_number(line)?).with_condition(condition))
        }
        None => Ok(SourceBreakpoint::at_line(line_number(text)?)),
    }
}

/// 脚本执行统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScriptSummary {
    pub commands: usize,
    pub switches: usize,
    /// 被吸收的后端请求失败数
    pub backend_failures: usize,
}

/// 执行脚本；每次切换后等待后端请求结束，以便报告失败
pub async fn run_script(
    manager: &mut GroupManager,
    script: &str,
) -> Result<ScriptSummary, ScriptError> {
    let mut summary = ScriptSummary::default();
    for (line_num, line) in script.lines().enumerate() {
        let command = parse(line).map_err(|source| ScriptError::Parse {
            line: line_num + 1,
            source,
        })?;
        if command == Command::Empty {
            continue;
        }
        info!(line = line_num + 1, command = line.trim(), "执行脚本命令");
        summary.commands += 1;

        let handle = match command {
            Command::Save { group, spec } => {
                manager.save_breakpoints(spec, &group);
                None
            }
            Command::Switch(group) => {
                summary.switches += 1;
                Some(manager.switch_to(&group))
            }
            Command::Next(group) => {
                manager.set_next_group_name(group);
                None
            }
            Command::Hook(hook) => {
                manager.set_hook(hook);
                None
            }
            Command::Unhook(location) => {
                manager.clear_hook(&location);
                None
            }
            Command::Border(border) => {
                manager.set_border(border);
                None
            }
            Command::Unborder(border) => {
                manager.clear_border(&border);
                None
            }
            Command::Disable => Some(manager.disable_current_group_breakpoints()),
            Command::Reset => {
                manager.reset();
                None
            }
            Command::List => {
                list_groups(manager);
                None
            }
            Command::Empty => None,
        };

        if let Some(handle) = handle {
            let report = handle.settled().await;
            for failure in &report.failures {
                warn!(line = line_num + 1, "{}", failure);
            }
            summary.backend_failures += report.failures.len();
        }
    }
    Ok(summary)
}

/// 把全部断点组写入日志
pub fn list_groups(manager: &GroupManager) {
    info!(
        current = manager.current_group_name(),
        next = manager.next_group_name(),
        "断点组列表"
    );
    for group in manager.groups() {
        let borders = group
            .borders()
            .map_or_else(|| "unset".to_string(), |b| b.len().to_string());
        info!(
            group = group.name(),
            files = group.file_breakpoints().len(),
            hooks = group.hooks().len(),
            borders = %borders,
            "断点组"
        );
        for hook in group.hooks().iter() {
            debug!(group = group.name(), location = %hook.location, "钩子");
        }
        for border in group.borders().into_iter().flat_map(|b| b.iter()) {
            debug!(group = group.name(), file = %border.file, line = border.line, "边界");
        }
    }
}
