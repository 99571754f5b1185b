//! 页面渲染服务 - 业务能力层
//!
//! 只处理单个路由：在独立的浏览器上下文中打开页面、安装请求过滤、
//! 导航并等待完成信号，最后序列化整个 DOM。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, NavigateParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::{Browser, Page};
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::config::GotoOptions;
use crate::error::{PrerenderError, Result};
use crate::infrastructure::TrafficFilter;

/// 单个路由的渲染结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// 非空的 HTML 文档
    Rendered(String),
    /// 序列化结果为空，视为该路由失败并终止所在批次
    Empty,
}

impl RenderOutcome {
    pub fn from_html(html: String) -> Self {
        if html.trim().is_empty() {
            RenderOutcome::Empty
        } else {
            RenderOutcome::Rendered(html)
        }
    }
}

/// 渲染能力
///
/// 批处理器只依赖这个接口，不直接接触浏览器。
#[async_trait]
pub trait RouteRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<RenderOutcome>;
}

/// 基于共享 Chrome 实例的渲染器
pub struct ChromeRenderer<'a> {
    browser: &'a Browser,
    goto_options: &'a GotoOptions,
    filter: TrafficFilter,
}

impl<'a> ChromeRenderer<'a> {
    pub fn new(browser: &'a Browser, goto_options: &'a GotoOptions) -> Self {
        Self {
            browser,
            goto_options,
            filter: TrafficFilter::new(&goto_options.blocked_urls),
        }
    }

    async fn render_in_context(
        &self,
        url: &str,
        context_id: BrowserContextId,
    ) -> Result<RenderOutcome> {
        let params = blank_target_params(context_id).map_err(|reason| {
            PrerenderError::Navigation {
                url: url.to_string(),
                reason,
            }
        })?;
        let page = self
            .browser
            .new_page(params)
            .await
            .map_err(|e| PrerenderError::cdp(url, e))?;

        // 过滤器必须在导航之前生效，并一直保持到页面关闭
        let (guard, result) = match self.filter.install(&page).await {
            Ok(guard) => (Some(guard), self.render_on_page(&page, url).await),
            Err(e) => (None, Err(PrerenderError::cdp(url, e))),
        };

        if let Err(e) = page.close().await {
            warn!("关闭页面失败 ({}): {}", url, e);
        }
        drop(guard);
        result
    }

    async fn render_on_page(&self, page: &Page, url: &str) -> Result<RenderOutcome> {
        self.navigate(page, url).await?;

        let html = page
            .content()
            .await
            .map_err(|e| PrerenderError::cdp(url, e))?;
        debug!("序列化完成: {} ({} 字节)", url, html.len());

        Ok(RenderOutcome::from_html(html))
    }

    /// 导航并等待配置的完成信号
    async fn navigate(&self, page: &Page, url: &str) -> Result<()> {
        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| PrerenderError::cdp(url, e))?;
        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(|e| PrerenderError::cdp(url, e))?;

        let mut params = NavigateParams::new(url);
        params.referrer = self.goto_options.referer.clone();
        let navigation = self.navigate_and_wait(page, url, params, &mut lifecycle);

        let timeout_ms = self.goto_options.timeout;
        if timeout_ms == 0 {
            return navigation.await;
        }
        tokio::time::timeout(Duration::from_millis(timeout_ms), navigation)
            .await
            .map_err(|_| PrerenderError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms,
            })?
    }

    async fn navigate_and_wait<S>(
        &self,
        page: &Page,
        url: &str,
        params: NavigateParams,
        lifecycle: &mut S,
    ) -> Result<()>
    where
        S: Stream<Item = Arc<EventLifecycleEvent>> + Unpin,
    {
        let response = page
            .execute(params)
            .await
            .map_err(|e| PrerenderError::cdp(url, e))?;
        let returns = &response.result;

        if let Some(reason) = &returns.error_text {
            return Err(PrerenderError::Navigation {
                url: url.to_string(),
                reason: reason.clone(),
            });
        }

        // 同文档导航没有 loader，不会产生新的生命周期事件
        let Some(loader_id) = &returns.loader_id else {
            return Ok(());
        };

        let expected = self.goto_options.wait_until.lifecycle_event();
        while let Some(event) = lifecycle.next().await {
            if event.name == expected
                && event.frame_id == returns.frame_id
                && &event.loader_id == loader_id
            {
                return Ok(());
            }
        }
        Err(PrerenderError::Navigation {
            url: url.to_string(),
            reason: format!("页面在收到 {} 之前关闭", expected),
        })
    }
}

/// 在指定浏览器上下文中打开空白页的参数
fn blank_target_params(
    context_id: BrowserContextId,
) -> std::result::Result<CreateTargetParams, String> {
    CreateTargetParams::builder()
        .url("about:blank")
        .browser_context_id(context_id)
        .build()
}

#[async_trait]
impl RouteRenderer for ChromeRenderer<'_> {
    /// 每个路由使用一个全新的浏览器上下文，渲染结束后销毁
    async fn render(&self, url: &str) -> Result<RenderOutcome> {
        let context_id = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| PrerenderError::cdp(url, e))?
            .result
            .browser_context_id
            .clone();

        let result = self.render_in_context(url, context_id.clone()).await;

        if let Err(e) = self
            .browser
            .execute(DisposeBrowserContextParams::new(context_id))
            .await
        {
            warn!("销毁浏览器上下文失败 ({}): {}", url, e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_documents_are_empty_outcomes() {
        assert_eq!(RenderOutcome::from_html(String::new()), RenderOutcome::Empty);
        assert_eq!(RenderOutcome::from_html("  \n\t".into()), RenderOutcome::Empty);
    }

    #[test]
    fn blank_target_opens_in_given_context() {
        let context_id = BrowserContextId::new("ctx-1");
        let params = blank_target_params(context_id.clone()).unwrap();

        assert_eq!(params.url, "about:blank");
        assert_eq!(params.browser_context_id, Some(context_id));
    }

    #[test]
    fn non_blank_documents_are_rendered() {
        let html = "<html><body><h1>About</h1></body></html>".to_string();
        assert_eq!(
            RenderOutcome::from_html(html.clone()),
            RenderOutcome::Rendered(html)
        );
    }
}
