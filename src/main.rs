use anyhow::Result;
use spa_prerender::config;
use spa_prerender::orchestrator;
use spa_prerender::utils::logging;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 配置加载失败时不会启动任何服务
    let config_path = config::config_path_from_env();
    let summary = orchestrator::run_from_file(&config_path).await?;

    if summary.is_complete() {
        info!("✅ 预渲染任务全部完成!");
        std::process::exit(0);
    }

    warn!("⚠️ {} 个路由未生成输出文件", summary.unrendered());
    std::process::exit(1);
}
