//! # SPA Prerender
//!
//! 通过无头浏览器把单页应用的各个路由预渲染为静态 HTML
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `StaticServer` - 本地静态服务器，显式启动/关闭
//! - `TrafficFilter` - 页面级请求拦截策略
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 只处理单个路由
//! - `page_renderer` - 渲染一个 URL 并序列化 DOM
//! - `route_path` - 路由到输出文件的映射与写出
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 分批并发渲染
//! - `orchestrator/pipeline` - 整次运行的生命周期管理
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::RenderConfig;
pub use error::{PrerenderError, Result};
pub use orchestrator::{run, run_from_file, RunSummary};
pub use services::{RenderOutcome, RouteRenderer};
