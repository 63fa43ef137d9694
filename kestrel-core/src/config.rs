use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ContainerError, ContainerResult};
use crate::logging::{LogFormat, LogLevel, LoggingConfig};

/// 默认的 Bean 名称清单路径
pub const DEFAULT_BEAN_LIST: &str = "beans.txt";

/// 环境变量前缀
pub const ENV_PREFIX: &str = "KESTREL_";

/// 待解析 Bean 的排序策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    /// 只按直接依赖两两调整顺序，单次尝试（默认）
    ///
    /// 待解析 Bean 之间深度超过 2 的依赖链可能无法解析。
    #[default]
    Pairwise,

    /// 完整拓扑排序，报告循环依赖
    Topological,
}

impl FromStr for ResolutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pairwise" => Ok(ResolutionStrategy::Pairwise),
            "topological" => Ok(ResolutionStrategy::Topological),
            _ => Err(format!("Invalid resolution strategy: {}", s)),
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionStrategy::Pairwise => write!(f, "pairwise"),
            ResolutionStrategy::Topological => write!(f, "topological"),
        }
    }
}

/// 配置文件中的 `[logging]` 段
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub format: Option<String>,
    pub filter: Option<String>,
    pub show_target: bool,
}

impl LoggingSection {
    /// 转换为 [`LoggingConfig`]，无法识别的级别和格式使用默认值
    pub fn to_logging_config(&self) -> LoggingConfig {
        let mut config = LoggingConfig::default();

        if let Some(level) = self.level.as_deref() {
            match level.parse::<LogLevel>() {
                Ok(level) => config.level = level,
                Err(e) => tracing::warn!("{}, using {}", e, config.level),
            }
        }

        if let Some(format) = self.format.as_deref() {
            match format.parse::<LogFormat>() {
                Ok(format) => config.format = format,
                Err(e) => tracing::warn!("{}, using {}", e, config.format),
            }
        }

        config.filter = self.filter.clone();
        config.show_target = self.show_target;
        config
    }
}

/// 容器配置
///
/// ```toml
/// bean_list = "assets/beans.txt"
/// resolution = "topological"
///
/// [logging]
/// level = "debug"
/// format = "compact"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Bean 名称清单路径
    pub bean_list: PathBuf,

    /// 待解析 Bean 的排序策略
    pub resolution: ResolutionStrategy,

    /// 日志配置（可选）
    pub logging: Option<LoggingSection>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            bean_list: PathBuf::from(DEFAULT_BEAN_LIST),
            resolution: ResolutionStrategy::default(),
            logging: None,
        }
    }
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> ContainerResult<Self> {
        toml::from_str(content).map_err(|e| ContainerError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> ContainerResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ContainerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        tracing::debug!("Loaded container config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// 用 `KESTREL_BEAN_LIST` 和 `KESTREL_RESOLUTION` 覆盖配置
    pub fn with_env_overrides(self) -> ContainerResult<Self> {
        self.with_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> ContainerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bean_list) = lookup("BEAN_LIST") {
            self.bean_list = PathBuf::from(bean_list);
        }

        if let Some(resolution) = lookup("RESOLUTION") {
            self.resolution = resolution.parse().map_err(ContainerError::Config)?;
        }

        Ok(self)
    }

    pub fn bean_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.bean_list = path.into();
        self
    }

    pub fn resolution(mut self, strategy: ResolutionStrategy) -> Self {
        self.resolution = strategy;
        self
    }

    /// 配置文件中声明的日志配置
    pub fn logging_config(&self) -> Option<LoggingConfig> {
        self.logging.as_ref().map(LoggingSection::to_logging_config)
    }
}
