//! 路由路径映射 - 业务能力层
//!
//! 把路由映射为输出目录下的文件路径，并负责写出渲染结果。
//!
//! 映射规则：
//! - `/` → `index.html`
//! - 以 `/` 结尾的路由 → `<路由>/index.html`
//! - 最后一段带扩展名（如 `/404.html`）→ 原样作为文件名
//! - 其余 → `<路由>/index.html`（如 `/about` → `about/index.html`）

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::error::{PrerenderError, Result};

/// 默认文件名
pub const INDEX_FILE: &str = "index.html";

/// 计算路由相对于输出目录的文件路径（不访问文件系统）
pub fn route_relative_path(route: &str) -> PathBuf {
    let trimmed = route.trim_start_matches('/');
    let (dir, leaf) = match trimmed.rfind('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => ("", trimmed),
    };

    let mut path: PathBuf = dir.split('/').filter(|s| !s.is_empty()).collect();
    if leaf.is_empty() {
        path.push(INDEX_FILE);
    } else if Path::new(leaf).extension().is_some() {
        path.push(leaf);
    } else {
        path.push(leaf);
        path.push(INDEX_FILE);
    }
    path
}

/// 把路由映射为输出文件路径，并确保父目录存在
///
/// 目录创建是幂等的，目录已存在不视为错误。
pub async fn map_route_to_path(route: &str, output_dir: &Path) -> Result<PathBuf> {
    let file_path = output_dir.join(route_relative_path(route));

    if let Some(parent) = file_path.parent() {
        if parent != output_dir {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PrerenderError::write(parent, e))?;
        }
    }

    Ok(file_path)
}

/// 写出单个路由的 HTML，已存在的文件会被覆盖
pub async fn write_route_file(route: &str, output_dir: &Path, html: &str) -> Result<PathBuf> {
    let file_path = map_route_to_path(route, output_dir).await?;
    fs::write(&file_path, html)
        .await
        .map_err(|e| PrerenderError::write(&file_path, e))?;

    info!("📝 已生成 {}", file_path.display());
    Ok(file_path)
}

/// 找出映射到同一输出文件的路由组
///
/// 这类冲突只做报告，不去重也不报错：后写入的路由会覆盖先写入的。
pub fn find_path_collisions(routes: &[String]) -> Vec<(PathBuf, Vec<String>)> {
    let mut by_path: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for route in routes {
        let entry = by_path.entry(route_relative_path(route)).or_default();
        if !entry.contains(route) {
            entry.push(route.clone());
        }
    }

    by_path
        .into_iter()
        .filter(|(_, routes)| routes.len() > 1)
        .collect()
}
