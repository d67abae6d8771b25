//! 거래소 실행 프로파일.
//!
//! 분할 주문 임계값, 보정 청크 수, 청크 간 대기, 현물 매수 안전 마진은
//! 거래소별 호가 단위와 레이트리밋 특성에 맞춰 경험적으로 고른 값입니다.
//! 일반 공식으로 환원되지 않으므로 이름 붙은 설정 값으로 유지합니다.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use order_core::Side;

/// 한 방향(매수 또는 매도)의 분할 주문 프로파일.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitProfile {
    /// 청크 수 계산 기준이 되는 명목가치 (호가 자산 단위)
    pub threshold: Decimal,
    /// 반올림 보정 청크 수.
    /// 청크 수량이 정밀도 절단으로 줄어드는 만큼 누적 체결이 목표에
    /// 못 미치지 않도록 청크를 추가합니다
    pub bias: u32,
    /// 청크 간 대기 (초). 시장 충격과 레이트리밋 노출을 줄입니다
    pub pacing_secs: u64,
}

impl SplitProfile {
    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_secs)
    }
}

/// 거래소 실행 프로파일.
///
/// TOML 설정에서 역직렬화할 수 있으며, 코드 생성자가 검증된 기본값을
/// 제공합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueProfile {
    /// 프로파일 이름 (로깅용)
    pub name: String,
    /// 현물 매수 percent 사이징에서 빼는 안전 마진 (퍼센트 포인트).
    /// 잔고 반올림으로 인한 잔고 부족 거절을 피하기 위한 값이며,
    /// 생략하면 마진 없이 사이징합니다
    #[serde(default)]
    pub spot_buy_margin_pct: Option<Decimal>,
    /// 현물 매수 분할 프로파일. 없으면 단일 제출
    #[serde(default)]
    pub buy_split: Option<SplitProfile>,
    /// 현물 매도 분할 프로파일. 없으면 단일 제출
    #[serde(default)]
    pub sell_split: Option<SplitProfile>,
}

impl VenueProfile {
    /// KRW 현물 거래소 프로파일.
    ///
    /// 임계값/보정/대기 값은 운영 중 관측으로 튜닝된 것입니다:
    /// 매수는 10만 KRW 단위로 나눠 20초 간격, 매도는 15만 KRW 단위로
    /// 나눠 10초 간격. 매도 보정이 +2인 것은 마지막 청크의 잔여 물량
    /// 정리까지 감안한 값입니다.
    pub fn krw_spot() -> Self {
        Self {
            name: "krw-spot".to_string(),
            spot_buy_margin_pct: None,
            buy_split: Some(SplitProfile {
                threshold: dec!(100000),
                bias: 1,
                pacing_secs: 20,
            }),
            sell_split: Some(SplitProfile {
                threshold: dec!(150000),
                bias: 2,
                pacing_secs: 10,
            }),
        }
    }

    /// USDT 마진 거래소 프로파일.
    ///
    /// 분할 없이 단일 제출하며, 현물 매수 percent 사이징에 0.5%p
    /// 안전 마진을 적용합니다.
    pub fn usdt_futures() -> Self {
        Self {
            name: "usdt-futures".to_string(),
            spot_buy_margin_pct: Some(dec!(0.5)),
            buy_split: None,
            sell_split: None,
        }
    }

    /// 방향별 분할 프로파일 조회.
    pub fn split_for(&self, side: Side) -> Option<&SplitProfile> {
        match side {
            Side::Buy => self.buy_split.as_ref(),
            Side::Sell => self.sell_split.as_ref(),
        }
    }
}
