//! 网络流量过滤器 - 基础设施层
//!
//! 逐个决定页面发出的请求是放行还是中止：
//! 1. 图片请求一律中止（不影响序列化后的 DOM）
//! 2. URL 包含任一屏蔽子串的请求中止（区分大小写的子串匹配）
//! 3. 其余请求放行

use std::sync::Arc;

use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

/// 对单个请求的处理决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    Continue,
    Abort,
}

/// 请求拦截任务的持有者
///
/// 存活期间持续应答页面被暂停的请求，drop 时终止后台任务。
/// 页面启用了 `Fetch` 拦截后，必须持有到页面关闭，否则之后的请求会一直挂起。
#[derive(Debug)]
pub struct FilterGuard {
    task: JoinHandle<()>,
}

impl FilterGuard {
    fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }
}

impl Drop for FilterGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// 请求过滤策略
///
/// 只持有不可变的屏蔽列表，可在并发页面之间廉价克隆。
#[derive(Debug, Clone, Default)]
pub struct TrafficFilter {
    blocked_urls: Arc<[String]>,
}

impl TrafficFilter {
    pub fn new(blocked_urls: &[String]) -> Self {
        Self {
            blocked_urls: blocked_urls.into(),
        }
    }

    /// 按顺序匹配规则，首个命中的规则生效
    pub fn decide(&self, resource_type: &ResourceType, url: &str) -> RequestDecision {
        if *resource_type == ResourceType::Image {
            return RequestDecision::Abort;
        }
        if self
            .blocked_urls
            .iter()
            .any(|blocked| url.contains(blocked.as_str()))
        {
            return RequestDecision::Abort;
        }
        RequestDecision::Continue
    }

    /// 在页面上启用请求拦截
    ///
    /// 必须在导航之前调用。返回的 guard 需持有到页面关闭之后。
    pub async fn install(&self, page: &Page) -> Result<FilterGuard, CdpError> {
        let mut paused = page.event_listener::<EventRequestPaused>().await?;
        page.execute(EnableParams::default()).await?;

        let filter = self.clone();
        let page = page.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let url = &event.request.url;
                let outcome = match filter.decide(&event.resource_type, url) {
                    RequestDecision::Abort => {
                        debug!("🚫 拦截请求: {}", url);
                        page.execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ())
                    }
                    RequestDecision::Continue => page
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ()),
                };

                // 页面关闭后残留的请求无法再应答
                if let Err(e) = outcome {
                    debug!("应答被暂停的请求失败 ({}): {}", url, e);
                }
            }
        });

        Ok(FilterGuard::new(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> TrafficFilter {
        TrafficFilter::new(&["google-analytics".to_string(), "/ads/".to_string()])
    }

    #[test]
    fn images_are_always_aborted() {
        let filter = TrafficFilter::default();
        assert_eq!(
            filter.decide(&ResourceType::Image, "http://localhost:3000/logo.png"),
            RequestDecision::Abort
        );
        assert_eq!(
            filter.decide(&ResourceType::Image, "http://localhost:3000/"),
            RequestDecision::Abort
        );
    }

    #[test]
    fn blocked_substrings_are_aborted() {
        assert_eq!(
            filter().decide(
                &ResourceType::Script,
                "https://www.google-analytics.com/analytics.js"
            ),
            RequestDecision::Abort
        );
        assert_eq!(
            filter().decide(&ResourceType::Xhr, "http://localhost:3000/ads/banner.json"),
            RequestDecision::Abort
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(
            filter().decide(&ResourceType::Script, "https://GOOGLE-ANALYTICS.com/a.js"),
            RequestDecision::Continue
        );
    }

    #[tokio::test]
    async fn guard_keeps_task_alive_until_dropped() {
        let (alive_tx, mut alive_rx) = tokio::sync::oneshot::channel::<()>();
        let guard = FilterGuard::new(tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await;
        }));

        tokio::task::yield_now().await;
        assert!(matches!(
            alive_rx.try_recv(),
            Err(tokio::sync::oneshot::error::TryRecvError::Empty)
        ));

        drop(guard);
        assert!(alive_rx.await.is_err(), "任务应随 guard 一起终止");
    }

    #[test]
    fn other_requests_continue() {
        assert_eq!(
            filter().decide(&ResourceType::Document, "http://localhost:3000/about"),
            RequestDecision::Continue
        );
        assert_eq!(
            filter().decide(&ResourceType::Stylesheet, "http://localhost:3000/main.css"),
            RequestDecision::Continue
        );
    }
}
