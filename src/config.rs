use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PrerenderError, Result};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = ".rsp.json";
/// 每批路由数量
pub const DEFAULT_BATCH_SIZE: usize = 30;
/// 默认导航超时（毫秒）
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// 预渲染配置
///
/// 在加载时完成解析、默认值填充与校验，之后不再修改。
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// 静态服务器监听端口（0 表示由系统分配）
    pub port: u16,
    /// 需要预渲染的路由列表
    pub routes: Vec<String>,
    /// 构建目录：既作为静态资源目录，也作为输出目录
    pub build_directory: PathBuf,
    /// 每批路由数量
    pub batch_size: usize,
    /// 浏览器相关配置
    pub engine: EngineOptions,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            routes: vec!["/".to_string()],
            build_directory: PathBuf::from("./build"),
            batch_size: DEFAULT_BATCH_SIZE,
            engine: EngineOptions::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    pub launch_options: LaunchOptions,
    pub goto_options: GotoOptions,
}

/// 浏览器启动参数
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchOptions {
    pub headless: bool,
    pub executable_path: Option<PathBuf>,
    pub args: Vec<String>,
    pub default_viewport: Option<ViewportOptions>,
    /// 启动超时（毫秒）
    pub timeout: Option<u64>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable_path: None,
            args: Vec::new(),
            default_viewport: None,
            timeout: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ViewportOptions {
    pub width: u32,
    pub height: u32,
}

/// 页面导航参数
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GotoOptions {
    pub wait_until: WaitUntil,
    /// 等待完成信号的超时（毫秒），0 表示不限时
    pub timeout: u64,
    pub referer: Option<String>,
    /// 需要拦截的 URL 子串（区分大小写）
    pub blocked_urls: Vec<String>,
}

impl Default for GotoOptions {
    fn default() -> Self {
        Self {
            wait_until: WaitUntil::default(),
            timeout: DEFAULT_NAVIGATION_TIMEOUT_MS,
            referer: None,
            blocked_urls: Vec::new(),
        }
    }
}

/// 导航完成信号
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    /// 500ms 内没有任何网络连接
    #[default]
    NetworkIdle0,
    /// 500ms 内网络连接不超过 2 个
    NetworkIdle2,
}

impl WaitUntil {
    /// 对应的 CDP 页面生命周期事件名
    pub fn lifecycle_event(self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "DOMContentLoaded",
            WaitUntil::NetworkIdle0 => "networkIdle",
            WaitUntil::NetworkIdle2 => "networkAlmostIdle",
        }
    }
}

impl RenderConfig {
    /// 从文件加载配置
    ///
    /// `.toml` 文件按 TOML 解析，其余按 JSON 解析。加载后构建目录被解析为绝对路径。
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PrerenderError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::parse(path, &content)?;
        config.build_directory = absolutize(&config.build_directory).map_err(|source| {
            PrerenderError::ConfigRead {
                path: config.build_directory.clone(),
                source,
            }
        })?;
        config.validate()?;

        debug!("配置加载完成: {:?}", config);
        Ok(config)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        let parsed = if is_toml {
            toml::from_str(content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| PrerenderError::ConfigParse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.routes.is_empty() {
            return Err(PrerenderError::ConfigInvalid("routes 不能为空".into()));
        }
        if self.batch_size == 0 {
            return Err(PrerenderError::ConfigInvalid("batchSize 必须大于 0".into()));
        }
        for route in &self.routes {
            if !route.starts_with('/') {
                return Err(PrerenderError::ConfigInvalid(format!(
                    "路由必须以 '/' 开头: {}",
                    route
                )));
            }
            if route.split('/').any(|segment| segment == "..") {
                return Err(PrerenderError::ConfigInvalid(format!(
                    "路由不能包含 '..': {}",
                    route
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for route in &self.routes {
            if !seen.insert(route.as_str()) {
                warn!("⚠️ 路由重复出现，将被渲染多次: {}", route);
            }
        }
        Ok(())
    }
}

/// 配置文件路径，可通过 `RSP_CONFIG` 覆盖
pub fn config_path_from_env() -> PathBuf {
    std::env::var("RSP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_json_with_defaults() {
        let (_dir, path) = write_config(
            ".rsp.json",
            r#"{"port": 5000, "routes": ["/", "/about"], "buildDirectory": "./build"}"#,
        );
        let config = RenderConfig::load(&path).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.routes, vec!["/", "/about"]);
        assert!(config.build_directory.is_absolute());
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert!(config.engine.launch_options.headless);
        assert_eq!(config.engine.goto_options.wait_until, WaitUntil::NetworkIdle0);
        assert_eq!(config.engine.goto_options.timeout, DEFAULT_NAVIGATION_TIMEOUT_MS);
        assert!(config.engine.goto_options.blocked_urls.is_empty());
    }

    #[test]
    fn loads_engine_options() {
        let (_dir, path) = write_config(
            ".rsp.json",
            r#"{
                "routes": ["/"],
                "engine": {
                    "launchOptions": {"headless": false, "args": ["--no-sandbox"], "defaultViewport": {"width": 1280, "height": 720}},
                    "gotoOptions": {"waitUntil": "networkidle2", "timeout": 0, "blockedUrls": ["google-analytics"]}
                }
            }"#,
        );
        let config = RenderConfig::load(&path).unwrap();
        let engine = &config.engine;

        assert!(!engine.launch_options.headless);
        assert_eq!(engine.launch_options.args, vec!["--no-sandbox"]);
        assert_eq!(
            engine.launch_options.default_viewport,
            Some(ViewportOptions { width: 1280, height: 720 })
        );
        assert_eq!(engine.goto_options.wait_until, WaitUntil::NetworkIdle2);
        assert_eq!(engine.goto_options.timeout, 0);
        assert_eq!(engine.goto_options.blocked_urls, vec!["google-analytics"]);
    }

    #[test]
    fn loads_toml_by_extension() {
        let (_dir, path) = write_config(
            "rsp.toml",
            "port = 4000\nroutes = [\"/\", \"/blog/post-1\"]\nbatchSize = 5\n",
        );
        let config = RenderConfig::load(&path).unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.routes.len(), 2);
    }

    #[test]
    fn missing_file_is_config_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RenderConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, PrerenderError::ConfigRead { .. }));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let (_dir, path) = write_config(".rsp.json", "{ routes: ");
        let err = RenderConfig::load(&path).unwrap_err();
        assert!(matches!(err, PrerenderError::ConfigParse { .. }));
    }

    #[test]
    fn rejects_invalid_routes() {
        let mut config = RenderConfig::default();
        config.routes = vec!["about".into()];
        assert!(matches!(config.validate(), Err(PrerenderError::ConfigInvalid(_))));

        config.routes = vec!["/../etc".into()];
        assert!(matches!(config.validate(), Err(PrerenderError::ConfigInvalid(_))));

        config.routes = Vec::new();
        assert!(matches!(config.validate(), Err(PrerenderError::ConfigInvalid(_))));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let config = RenderConfig {
            batch_size: 0,
            ..RenderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn wait_until_maps_to_lifecycle_events() {
        assert_eq!(WaitUntil::NetworkIdle0.lifecycle_event(), "networkIdle");
        assert_eq!(WaitUntil::NetworkIdle2.lifecycle_event(), "networkAlmostIdle");
        assert_eq!(WaitUntil::DomContentLoaded.lifecycle_event(), "DOMContentLoaded");
    }
}
