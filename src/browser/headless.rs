use std::time::Duration;

use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::LaunchOptions;
use crate::error::{PrerenderError, Result};

/// 已启动的浏览器及其事件处理任务
pub struct BrowserSession {
    pub browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// 关闭浏览器进程并停止事件处理
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            error!("关闭浏览器失败: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("等待浏览器进程退出失败: {}", e);
        }
        self.handler_task.abort();
        info!("🛑 浏览器已关闭");
    }
}

/// 把启动参数转换为 chromiumoxide 的浏览器配置
pub fn build_browser_config(options: &LaunchOptions) -> Result<BrowserConfig> {
    let mut builder = if options.headless {
        BrowserConfig::builder().new_headless_mode()
    } else {
        BrowserConfig::builder().with_head()
    };

    if let Some(path) = &options.executable_path {
        builder = builder.chrome_executable(path);
    }
    if !options.args.is_empty() {
        builder = builder.args(options.args.iter().map(String::as_str));
    }
    if let Some(viewport) = options.default_viewport {
        builder = builder
            .window_size(viewport.width, viewport.height)
            .viewport(Viewport {
                width: viewport.width,
                height: viewport.height,
                ..Default::default()
            });
    }
    if let Some(timeout) = options.timeout {
        builder = builder.launch_timeout(Duration::from_millis(timeout));
    }

    builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        PrerenderError::BrowserLaunch(e)
    })
}

/// 启动整个运行共享的浏览器实例
pub async fn launch_browser(options: &LaunchOptions) -> Result<BrowserSession> {
    info!("🚀 启动无头浏览器...");
    let config = build_browser_config(options)?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        PrerenderError::BrowserLaunch(e.to_string())
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    Ok(BrowserSession {
        browser,
        handler_task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewportOptions;

    #[test]
    fn builds_config_from_launch_options() {
        let options = LaunchOptions {
            // 显式指定路径时不会探测本机 Chrome
            executable_path: Some(std::path::PathBuf::from("/usr/bin/chromium")),
            args: vec!["--no-sandbox".into(), "--disable-gpu".into()],
            default_viewport: Some(ViewportOptions {
                width: 1280,
                height: 720,
            }),
            timeout: Some(10_000),
            ..LaunchOptions::default()
        };
        assert!(build_browser_config(&options).is_ok());
    }

    #[tokio::test]
    #[ignore] // 需要本机安装 Chrome：cargo test -- --ignored
    async fn launches_and_closes_browser() {
        let session = launch_browser(&LaunchOptions::default()).await.unwrap();
        session.close().await;
    }
}
