//! 会话配置（profile/session.toml）

use std::path::{Path, PathBuf};

use anyhow::Context;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

use crate::backend::SourceFileMap;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置格式错误: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("远程会话需要配置 [path_map]")]
    MissingPathMap,
    #[error("上下文 `{0}` 重复定义")]
    DuplicateContext(String),
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionSection {
    /// 会话开始时的当前断点组
    pub initial_group: String,
    /// 预期的下一个断点组，缺省与 initial_group 相同
    #[serde(default)]
    pub next_group: Option<String>,
    /// 是否为远程（SSH）会话
    #[serde(default)]
    pub remote: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PolicySection {
    /// 未配置上下文的符号表目录
    #[serde(default)]
    pub default_symbol_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PathMapConfig {
    pub local: PathBuf,
    pub remote: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    pub name: String,
    #[serde(default)]
    pub symbol_files: Vec<String>,
    #[serde(default)]
    pub source_prefixes: Vec<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionConfig {
    pub session: SessionSection,
    #[serde(default)]
    pub policy: PolicySection,
    #[serde(default)]
    pub path_map: Option<PathMapConfig>,
    #[serde(default, rename = "context")]
    pub contexts: Vec<ContextConfig>,
}

impl SessionConfig {
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<SessionConfig> {
        let toml_str = std::fs::read_to_string(&path)
            .with_context(|| format!("无法读取会话配置文件: {:?}", path.as_ref().as_os_str()))?;
        let config = Self::from_toml_str(&toml_str)
            .with_context(|| format!("无法解析会话配置文件: {:?}", path.as_ref().as_os_str()))?;
        anyhow::Ok(config)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<SessionConfig, ConfigError> {
        let config: SessionConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.remote && self.path_map.is_none() {
            return Err(ConfigError::MissingPathMap);
        }
        let mut seen = FxHashSet::default();
        for context in &self.contexts {
            if !seen.insert(context.name.as_str()) {
                return Err(ConfigError::DuplicateContext(context.name.clone()));
            }
        }
        Ok(())
    }

    pub fn next_group(&self) -> &str {
        self.session
            .next_group
            .as_deref()
            .unwrap_or(&self.session.initial_group)
    }

    /// 远程会话的路径映射；本地会话返回 `None`
    pub fn path_mapper(&self) -> Option<SourceFileMap> {
        match (&self.path_map, self.session.remote) {
            (Some(map), true) => Some(SourceFileMap::new(map.local.clone(), map.remote.clone())),
            _ => None,
        }
    }
}
