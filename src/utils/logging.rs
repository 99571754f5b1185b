//! 日志工具模块
//!
//! 提供日志初始化和进度输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::RenderConfig;
use crate::orchestrator::batch_processor::{BatchOutcome, BatchReport, RunSummary};

/// 初始化全局日志订阅者
///
/// 日志级别由 `RUST_LOG` 控制，默认 `info`。重复调用不会报错。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &RenderConfig) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - SPA 预渲染");
    info!("📁 构建目录: {}", config.build_directory.display());
    info!("🔌 端口: {}", config.port);
    info!("{}", "=".repeat(60));
}

/// 记录路由加载信息
///
/// # 参数
/// - `total`: 路由总数
/// - `total_batches`: 批次总数
/// - `batch_size`: 每批路由数
pub fn log_routes_loaded(total: usize, total_batches: usize, batch_size: usize) {
    info!("✓ 共 {} 个待渲染的路由", total);
    info!("📋 分为 {} 批并发处理，每批最多 {} 个", total_batches, batch_size);
}

/// 记录批次开始信息
pub fn log_batch_start(batch_num: usize, total_batches: usize, size: usize) {
    info!(
        "📦 开始处理第 {}/{} 批 ({} 个路由)",
        batch_num, total_batches, size
    );
}

/// 记录批次完成信息
pub fn log_batch_complete(report: &BatchReport) {
    match &report.outcome {
        BatchOutcome::Completed => info!(
            "✓ 第 {} 批完成: 成功 {}/{}",
            report.batch_num, report.written, report.size
        ),
        BatchOutcome::StoppedOnEmpty { route } | BatchOutcome::StoppedOnError { route, .. } => {
            info!(
                "✗ 第 {} 批在路由 \"{}\" 处提前结束: 成功 {}/{}",
                report.batch_num, route, report.written, report.size
            )
        }
    }
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary) {
    info!("{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.written, summary.total);
    info!("❌ 未生成: {}", summary.unrendered());
    info!("{}", "=".repeat(60));
}
