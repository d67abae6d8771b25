//! 주문 제출 재시도 유틸리티.
//!
//! 주문 생성 호출을 고정 간격으로 제한된 횟수까지 재시도합니다.
//! 이 코어는 일시적/영구적 실패를 구분하지 않습니다. 모든 실패는
//! 시도 예산 안에서 재시도 대상이며, 예산 소진 시 마지막 에러가
//! 호출 측으로 반환됩니다.
//!
//! # 예시
//!
//! ```rust,ignore
//! use order_exchange::retry::{submit_with_retry, RetryPolicy};
//!
//! let policy = RetryPolicy::spot();
//! let receipt = submit_with_retry(&policy, || adapter.create_order(&request)).await?;
//! ```

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use order_core::AdapterError;

/// 재시도 정책.
///
/// `max_attempts`는 제출 호출 총 횟수입니다 (최초 시도 포함).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// 최대 제출 횟수
    pub max_attempts: u32,
    /// 시도 간 고정 대기 (밀리초)
    pub delay_ms: u64,
}

impl RetryPolicy {
    /// 현물 매수/매도 정책 (5회, 100ms).
    pub fn spot() -> Self {
        Self {
            max_attempts: 5,
            delay_ms: 100,
        }
    }

    /// 선물 진입/청산 정책 (10회, 100ms).
    pub fn position() -> Self {
        Self {
            max_attempts: 10,
            delay_ms: 100,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// 재시도가 포함된 주문 제출 실행.
///
/// # Arguments
/// * `policy` - 재시도 정책
/// * `operation` - 주문 생성 비동기 작업
///
/// # Returns
/// * `Ok(T)` - 제출 성공 결과. 성공 이후 추가 호출은 없습니다.
/// * `Err(AdapterError)` - 예산 소진 후 마지막 시도의 에러
pub async fn submit_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: F,
) -> Result<T, AdapterError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempts = attempt, "재시도 후 주문 제출 성공");
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= policy.max_attempts {
                    warn!(
                        error = %e,
                        attempts = attempt,
                        "재시도 한도 초과, 마지막 에러 반환"
                    );
                    return Err(e);
                }

                warn!(
                    error = %e,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = policy.delay_ms,
                    "주문 제출 실패, 재시도 대기 중"
                );

                tokio::time::sleep(policy.delay()).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test]
    async fn test_immediate_success_single_call() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = submit_with_retry(&RetryPolicy::spot(), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AdapterError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        // 성공 이후 추가 호출 없음
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = submit_with_retry(&RetryPolicy::spot(), || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(AdapterError::Network("연결 실패".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhausted_returns_last_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let policy = RetryPolicy {
            max_attempts: 5,
            delay_ms: 100,
        };

        let result = submit_with_retry(&policy, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(AdapterError::Api("항상 실패".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(AdapterError::Api(_))));
        // 최대 제출 횟수를 넘지 않음
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_policy_attempt_budget() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = submit_with_retry(&RetryPolicy::position(), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(AdapterError::Network("항상 실패".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }
}
