use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};

/// 启动无头浏览器并导航到指定 URL
///
/// `chrome_executable` 为空时由 chromiumoxide 自行查找本机的 Chrome / Chromium
pub async fn launch_headless_browser(
    url: &str,
    chrome_executable: Option<&str>,
) -> AppResult<(Browser, Page)> {
    info!("🚀 启动无头浏览器...");
    debug!("目标 URL: {}", url);

    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--disable-gpu",           // 部分平台无头模式必须禁用 GPU
        "--no-sandbox",            // 容器内没有沙盒权限
        "--disable-dev-shm-usage", // 防止共享内存不足
    ]);
    if let Some(path) = chrome_executable {
        builder = builder.chrome_executable(Path::new(path));
    }
    let config = builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        AppError::browser_launch_failed(format!("配置无头浏览器失败: {}", e))
    })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        AppError::browser_launch_failed(e)
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page(url).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        e
    })?;

    info!("✅ 无头浏览器已导航到: {}", url);
    Ok((browser, page))
}
