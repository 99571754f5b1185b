//! 批量路由处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **分批**：把路由列表切成固定大小、互不重叠、保持原有顺序的批次
//! 2. **批间并发**：所有批次同时启动，共享同一个渲染器（浏览器）
//! 3. **批内串行**：渲染 → 写文件 → 下一个路由，严格按输入顺序
//! 4. **失败隔离**：空文档、渲染错误、写文件错误只终止所在批次的剩余路由
//! 5. **统计**：汇总每个批次的结果
//!
//! 批次以协作式异步任务并发执行（`join_all`），不使用额外线程。

use std::path::Path;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::services::page_renderer::{RenderOutcome, RouteRenderer};
use crate::services::route_path;
use crate::utils::logging;

/// 把路由列表切分为批次，最后一批可能较短
pub fn partition_routes(routes: &[String], batch_size: usize) -> Vec<&[String]> {
    routes.chunks(batch_size.max(1)).collect()
}

/// 批次的终止方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// 所有路由均已写出
    Completed,
    /// 某个路由渲染出空文档，提前结束
    StoppedOnEmpty { route: String },
    /// 某个路由渲染或写文件失败，提前结束
    StoppedOnError { route: String, message: String },
}

/// 单个批次的处理结果
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// 批次编号（从 1 开始）
    pub batch_num: usize,
    pub size: usize,
    pub written: usize,
    pub outcome: BatchOutcome,
}

/// 整次运行的统计
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total: usize,
    pub written: usize,
    pub batches: Vec<BatchReport>,
}

impl RunSummary {
    /// 没有输出文件的路由数量（失败或因提前结束而未处理）
    pub fn unrendered(&self) -> usize {
        self.total - self.written
    }

    pub fn is_complete(&self) -> bool {
        self.written == self.total
    }
}

/// 批量处理器
pub struct BatchProcessor<'a, R: RouteRenderer> {
    renderer: &'a R,
    base_url: &'a str,
    output_dir: &'a Path,
    batch_size: usize,
}

impl<'a, R: RouteRenderer> BatchProcessor<'a, R> {
    pub fn new(
        renderer: &'a R,
        base_url: &'a str,
        output_dir: &'a Path,
        batch_size: usize,
    ) -> Self {
        Self {
            renderer,
            base_url,
            output_dir,
            batch_size,
        }
    }

    /// 并发处理所有批次，等待全部结束后返回统计
    pub async fn run_all(&self, routes: &[String]) -> RunSummary {
        let batches = partition_routes(routes, self.batch_size);
        let total_batches = batches.len();
        logging::log_routes_loaded(routes.len(), total_batches, self.batch_size);

        let tasks = batches
            .into_iter()
            .enumerate()
            .map(|(idx, batch)| self.process_batch(idx + 1, total_batches, batch));
        let reports = join_all(tasks).await;

        RunSummary {
            total: routes.len(),
            written: reports.iter().map(|r| r.written).sum(),
            batches: reports,
        }
    }

    /// 串行处理单个批次
    async fn process_batch(
        &self,
        batch_num: usize,
        total_batches: usize,
        routes: &[String],
    ) -> BatchReport {
        logging::log_batch_start(batch_num, total_batches, routes.len());

        let mut written = 0;
        let mut outcome = BatchOutcome::Completed;

        for route in routes {
            info!("[批次 {}] 正在处理路由 \"{}\"", batch_num, route);
            let url = format!("{}{}", self.base_url, route);

            let html = match self.renderer.render(&url).await {
                Ok(RenderOutcome::Rendered(html)) => html,
                Ok(RenderOutcome::Empty) => {
                    warn!(
                        "[批次 {}] ⚠️ 路由 \"{}\" 渲染结果为空，终止本批剩余路由",
                        batch_num, route
                    );
                    outcome = BatchOutcome::StoppedOnEmpty {
                        route: route.clone(),
                    };
                    break;
                }
                Err(e) => {
                    error!("[批次 {}] ❌ 处理路由 \"{}\" 失败: {}", batch_num, route, e);
                    outcome = BatchOutcome::StoppedOnError {
                        route: route.clone(),
                        message: e.to_string(),
                    };
                    break;
                }
            };

            if let Err(e) = route_path::write_route_file(route, self.output_dir, &html).await {
                error!("[批次 {}] ❌ 处理路由 \"{}\" 失败: {}", batch_num, route, e);
                outcome = BatchOutcome::StoppedOnError {
                    route: route.clone(),
                    message: e.to_string(),
                };
                break;
            }
            written += 1;
        }

        let report = BatchReport {
            batch_num,
            size: routes.len(),
            written,
            outcome,
        };
        logging::log_batch_complete(&report);
        report
    }
}
