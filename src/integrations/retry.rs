// ==========================================
// Agenda 导入 - 外部调用重试策略
// ==========================================
// 策略: 固定次数, 线性退避（第 n 次失败后等待 delay * n）
// 失败: 次数耗尽后返回最后一次错误
// ==========================================

use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// 第 attempt 次失败后的等待时间
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay * attempt
    }

    /// 执行 operation, 失败时按策略重试
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= max_attempts => {
                    warn!(attempt, error = %err, "重试次数已耗尽");
                    return Err(err);
                }
                Err(err) => {
                    let wait = self.backoff(attempt);
                    warn!(attempt, max_attempts, wait_ms = wait.as_millis() as u64, error = %err, "请求失败, 准备重试");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
