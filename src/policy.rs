//! 上下文与文件之间的映射策略
//!
//! 策略由宿主会话在构造时注入：`files_for_context` 给出某个断点组需要的符号表文件，
//! `contexts_for_file` 给出某个源文件所属的断点组。

use std::path::{Path, PathBuf};

use crate::const_values::{ContextConfig, SessionConfig};

pub trait ContextPolicy: Send + Sync {
    /// 断点组对应的符号表文件
    fn files_for_context(&self, context: &str) -> Vec<String>;

    /// 源文件所属的断点组名
    fn contexts_for_file(&self, path: &str) -> Vec<String>;
}

/// 由两个闭包组成的策略
pub struct FnPolicy<F, G> {
    files_for_context: F,
    contexts_for_file: G,
}

impl<F, G> FnPolicy<F, G>
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
    G: Fn(&str) -> Vec<String> + Send + Sync,
{
    pub fn new(files_for_context: F, contexts_for_file: G) -> Self {
        Self {
            files_for_context,
            contexts_for_file,
        }
    }
}

impl<F, G> ContextPolicy for FnPolicy<F, G>
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
    G: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn files_for_context(&self, context: &str) -> Vec<String> {
        (self.files_for_context)(context)
    }

    fn contexts_for_file(&self, path: &str) -> Vec<String> {
        (self.contexts_for_file)(path)
    }
}

/// 配置表驱动的策略
///
/// 源文件按路径前缀归属到上下文；没有匹配的上下文时，文件路径本身就是组名，
/// 即一个用户程序一个断点组。未配置的上下文若给了默认符号目录，
/// 则取组名的文件名（去掉扩展名）作为该目录下的符号文件。
#[derive(Debug, Clone, Default)]
pub struct TablePolicy {
    contexts: Vec<ContextConfig>,
    default_symbol_dir: Option<PathBuf>,
}

impl TablePolicy {
    pub fn new(contexts: Vec<ContextConfig>, default_symbol_dir: Option<PathBuf>) -> Self {
        Self {
            contexts,
            default_symbol_dir,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.contexts.clone(),
            config.policy.default_symbol_dir.clone(),
        )
    }
}

impl ContextPolicy for TablePolicy {
    fn files_for_context(&self, context: &str) -> Vec<String> {
        if let Some(entry) = self.contexts.iter().find(|c| c.name == context) {
            return entry.symbol_files.clone();
        }
        let (Some(dir), Some(stem)) = (&self.default_symbol_dir, Path::new(context).file_stem())
        else {
            return Vec::new();
        };
        vec![dir.join(stem).to_string_lossy().into_owned()]
    }

    fn contexts_for_file(&self, path: &str) -> Vec<String> {
        let file = Path::new(path);
        let owners: Vec<String> = self
            .contexts
            .iter()
            .filter(|c| c.source_prefixes.iter().any(|prefix| file.starts_with(prefix)))
            .map(|c| c.name.clone())
            .collect();
        if owners.is_empty() {
            vec![path.to_string()]
        } else {
            owners
        }
    }
}
