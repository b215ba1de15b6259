//! 页面稳定等待
//!
//! 点击"添加"按钮后新字段需要时间渲染。默认固定等待，
//! 也可以在固定等待后轮询直到字段出现，轮询有上限，超时后照常继续

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// 各阶段等待时长
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelays {
    /// 分区之间的固定等待
    pub phase: Duration,
    /// 新增条目后的固定等待
    pub entry: Duration,
    /// 新增条目后轮询字段出现的上限，0 表示不轮询
    pub entry_poll_timeout: Duration,
    /// 轮询间隔
    pub entry_poll_interval: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            phase: Duration::from_millis(1000),
            entry: Duration::from_millis(500),
            entry_poll_timeout: Duration::ZERO,
            entry_poll_interval: Duration::from_millis(100),
        }
    }
}

impl SettleDelays {
    /// 不等待（测试用）
    pub fn none() -> Self {
        Self {
            phase: Duration::ZERO,
            entry: Duration::ZERO,
            entry_poll_timeout: Duration::ZERO,
            entry_poll_interval: Duration::ZERO,
        }
    }

    pub fn polls(&self) -> bool {
        !self.entry_poll_timeout.is_zero()
    }
}

/// 固定等待，0 时直接返回
pub async fn pause(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

/// 反复调用 `probe` 直到返回 true 或超时
///
/// 返回是否在超时前就绪；probe 出错视为未就绪
pub async fn wait_until<F, Fut>(limit: Duration, interval: Duration, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    if limit.is_zero() {
        return false;
    }
    let interval = interval.max(Duration::from_millis(1));

    let polling = async {
        loop {
            match probe().await {
                Ok(true) => return,
                Ok(false) => {}
                Err(e) => debug!("轮询出错，继续等待: {}", e),
            }
            sleep(interval).await;
        }
    };

    timeout(limit, polling).await.is_ok()
}
