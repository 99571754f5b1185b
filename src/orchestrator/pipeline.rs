//! 预渲染流水线 - 编排层
//!
//! 串联整个运行：加载配置 → 启动静态服务器 → 启动浏览器 → 批量渲染 → 关闭资源。
//! 静态服务器与浏览器都由这里持有，并在返回前显式关闭。

use std::path::Path;

use tracing::{info, warn};

use crate::browser;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::infrastructure::StaticServer;
use crate::orchestrator::batch_processor::{BatchProcessor, RunSummary};
use crate::services::page_renderer::ChromeRenderer;
use crate::services::route_path;
use crate::utils::logging;

/// 读取配置文件并执行一次完整的预渲染
///
/// 配置读取失败时直接返回，不会启动服务器，也不会写出任何文件。
pub async fn run_from_file(config_path: &Path) -> Result<RunSummary> {
    let config = RenderConfig::load(config_path)?;
    run(config).await
}

/// 执行一次完整的预渲染
///
/// 基础设施错误（服务器、浏览器）会终止整个运行；单个路由的失败只体现在返回的统计里。
pub async fn run(config: RenderConfig) -> Result<RunSummary> {
    logging::log_startup(&config);

    for (path, routes) in route_path::find_path_collisions(&config.routes) {
        warn!(
            "⚠️ 多个路由映射到同一输出文件 {}: {:?}，后写入的将覆盖先写入的",
            path.display(),
            routes
        );
    }

    let server = StaticServer::start(config.port, &config.build_directory, &config.routes).await?;

    let session = match browser::launch_browser(&config.engine.launch_options).await {
        Ok(session) => session,
        Err(e) => {
            server.stop().await;
            return Err(e);
        }
    };

    let summary = {
        let renderer = ChromeRenderer::new(&session.browser, &config.engine.goto_options);
        BatchProcessor::new(
            &renderer,
            server.base_url(),
            &config.build_directory,
            config.batch_size,
        )
        .run_all(&config.routes)
        .await
    };

    session.close().await;
    server.stop().await;

    logging::print_final_stats(&summary);
    info!("🏁 预渲染任务结束");
    Ok(summary)
}
