use std::path::PathBuf;

use thiserror::Error;

/// 预渲染错误类型
///
/// 基础设施阶段（配置、静态服务器、浏览器）的错误对整个运行是致命的；
/// 渲染与写文件阶段的错误只终止所在批次的剩余路由。
#[derive(Debug, Error)]
pub enum PrerenderError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解析配置文件失败
    #[error("解析配置文件失败 ({path}): {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// 配置校验失败
    #[error("配置校验失败: {0}")]
    ConfigInvalid(String),

    /// 构建目录中缺少根文档
    #[error("无法读取根文档 ({path}): {source}")]
    RootDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 静态服务器启动失败
    #[error("静态服务器启动失败 (端口: {port}): {source}")]
    ServerStart {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// 浏览器启动失败
    #[error("浏览器启动失败: {0}")]
    BrowserLaunch(String),

    /// 导航失败（浏览器返回的 errorText）
    #[error("导航到 {url} 失败: {reason}")]
    Navigation { url: String, reason: String },

    /// 等待完成信号超时
    #[error("导航到 {url} 超时 ({timeout_ms}ms)")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    /// CDP 调用失败
    #[error("渲染 {url} 时浏览器调用失败: {source}")]
    Cdp {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    /// 写入输出文件失败
    #[error("写入文件失败 ({path}): {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PrerenderError {
    // ========== 便捷构造函数 ==========

    /// 创建 CDP 调用错误
    pub fn cdp(url: impl Into<String>, source: chromiumoxide::error::CdpError) -> Self {
        PrerenderError::Cdp {
            url: url.into(),
            source,
        }
    }

    /// 创建写文件错误
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrerenderError::Write {
            path: path.into(),
            source,
        }
    }
}

/// 预渲染结果类型
pub type Result<T> = std::result::Result<T, PrerenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_identify_the_failing_stage() {
        let err = PrerenderError::ServerStart {
            port: 5000,
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().contains("5000"));

        let err = PrerenderError::NavigationTimeout {
            url: "http://127.0.0.1:3000/about".into(),
            timeout_ms: 30_000,
        };
        assert!(err.to_string().contains("/about"));
    }

    #[test]
    fn write_constructor_keeps_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = PrerenderError::write("/tmp/build/index.html", io);
        assert!(matches!(err, PrerenderError::Write { .. }));
        assert!(err.to_string().contains("/tmp/build/index.html"));
    }
}
