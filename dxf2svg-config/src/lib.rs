use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV_VAR: &str = "DXF2SVG_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `DXF2SVG_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        let cwd = env::current_dir().map_err(|source| ConfigError::Context {
            message: "获取当前工作目录失败".to_string(),
            source,
        })?;
        Self::discover_in(env::var_os(CONFIG_ENV_VAR).map(PathBuf::from), &cwd)
    }

    /// `explicit` 存在时直接加载，否则在 `base_dir/config/default.toml` 查找。
    pub fn discover_in(explicit: Option<PathBuf>, base_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let default_path = base_dir.join("config").join("default.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 输出画布。数值在构建转换参数时才校验。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "CanvasConfig::default_width")]
    pub width: f64,
    #[serde(default = "CanvasConfig::default_height")]
    pub height: f64,
    #[serde(default = "CanvasConfig::default_margin")]
    pub margin: f64,
    #[serde(default = "CanvasConfig::default_stroke_width")]
    pub stroke_width: f64,
    /// 背景填充色，空字符串表示不绘制背景。
    #[serde(default = "CanvasConfig::default_background")]
    pub background: String,
}

impl CanvasConfig {
    fn default_width() -> f64 {
        800.0
    }

    fn default_height() -> f64 {
        600.0
    }

    fn default_margin() -> f64 {
        50.0
    }

    fn default_stroke_width() -> f64 {
        1.0
    }

    fn default_background() -> String {
        "#FFFFFF".to_string()
    }

    pub fn background_fill(&self) -> Option<&str> {
        let fill = self.background.trim();
        (!fill.is_empty()).then_some(fill)
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            margin: Self::default_margin(),
            stroke_width: Self::default_stroke_width(),
            background: Self::default_background(),
        }
    }
}

/// 模板（分组）模式相关设置。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "GroupingConfig::default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub layer: Option<String>,
}

impl GroupingConfig {
    fn default_tolerance() -> f64 {
        1e-4
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tolerance: Self::default_tolerance(),
            layer: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
