//! 本地静态服务器 - 基础设施层
//!
//! 持有监听端口和后台服务任务，由编排层显式启动和关闭。
//! 已配置的路由直接返回根文档，使客户端路由在直接访问时也能正确启动；
//! 其余请求按静态文件处理。

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{debug, error, info, warn};

use crate::error::{PrerenderError, Result};
use crate::services::route_path::INDEX_FILE;

/// 监听地址，base URL 使用同一地址
const LOOPBACK: &str = "127.0.0.1";

#[derive(Clone)]
struct ServerState {
    routes: Arc<HashSet<String>>,
    /// 启动时读取的根文档，渲染过程中写出的文件不会替换它
    shell: Arc<str>,
    assets: ServeDir,
}

/// 运行中的静态服务器
pub struct StaticServer {
    base_url: String,
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl StaticServer {
    /// 绑定端口并在后台开始服务 `root` 目录
    pub async fn start(port: u16, root: &Path, routes: &[String]) -> Result<Self> {
        let index_path = root.join(INDEX_FILE);
        let shell = tokio::fs::read_to_string(&index_path)
            .await
            .map_err(|source| PrerenderError::RootDocument {
                path: index_path.clone(),
                source,
            })?;

        let state = ServerState {
            routes: Arc::new(routes.iter().cloned().collect()),
            shell: shell.into(),
            assets: ServeDir::new(root),
        };
        let app = Router::new().fallback(serve).with_state(state);

        let listener = TcpListener::bind((LOOPBACK, port))
            .await
            .map_err(|source| PrerenderError::ServerStart { port, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| PrerenderError::ServerStart { port, source })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                error!("静态服务器异常退出: {}", e);
            }
        });

        let base_url = format!("http://{}", local_addr);
        info!("🌐 静态服务器已启动: {} ({})", base_url, root.display());

        Ok(Self {
            base_url,
            local_addr,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 优雅关闭服务器并等待后台任务结束
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("等待静态服务器退出失败: {}", e);
        }
        debug!("静态服务器已关闭");
    }
}

async fn serve(State(state): State<ServerState>, request: Request) -> Response {
    if state.routes.contains(request.uri().path()) {
        return Html(state.shell.to_string()).into_response();
    }

    match state.assets.oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
