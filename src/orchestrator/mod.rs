//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `pipeline` - 预渲染流水线
//! - 持有静态服务器与浏览器，负责启动和关闭
//! - 把基础设施错误上抛为致命错误
//!
//! ### `batch_processor` - 批量路由处理器
//! - 分批、批间并发、批内串行
//! - 把单个路由的失败隔离在所在批次内
//!
//! ## 层次关系
//!
//! ```text
//! pipeline (StaticServer + Browser)
//!     ↓
//! batch_processor (处理 Vec<Route>)
//!     ↓
//! services (能力层：page_renderer / route_path)
//!     ↓
//! infrastructure (基础设施：StaticServer / TrafficFilter)
//! ```

pub mod batch_processor;
pub mod pipeline;

pub use batch_processor::{BatchOutcome, BatchProcessor, BatchReport, RunSummary};
pub use pipeline::{run, run_from_file};
