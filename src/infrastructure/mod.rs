pub mod static_server;
pub mod traffic_filter;

pub use static_server::StaticServer;
pub use traffic_filter::{FilterGuard, RequestDecision, TrafficFilter};
