//! 분할 주문 계획.
//!
//! 현물 주문을 명목가치 기준으로 여러 청크로 나눕니다. 청크 수 계산은
//! `max(1, round(명목가치 / 임계값)) + 보정`이며, 반올림은 은행가
//! 반올림입니다. 계획은 순수 함수로 계산되고, 실행(순차 제출과 간격
//! 대기)은 세션이 담당합니다.

use std::time::Duration;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use order_core::Side;
use order_exchange::VenueProfile;

/// 분할 계획.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    /// 청크 수 (항상 1 이상)
    pub count: u32,
    /// 청크당 수량 (정밀도 양자화 전)
    pub chunk_amount: Decimal,
    /// 청크 간 대기
    pub pacing: Duration,
    /// 마지막 청크에서 계산 수량 대신 실시간 기초 자산 잔고를 쓸지 여부.
    /// 매도 분할에서 앞 청크들의 절단 잔여를 쓸어내기 위한 것
    pub sweep_residual: bool,
}

impl SplitPlan {
    /// 분할 없는 단일 제출 계획.
    pub fn single(amount: Decimal) -> Self {
        Self {
            count: 1,
            chunk_amount: amount,
            pacing: Duration::ZERO,
            sweep_residual: false,
        }
    }
}

/// 분할 계획 수립.
///
/// 프로파일에 해당 방향의 분할 설정이 없으면 단일 제출 계획을
/// 반환합니다.
pub fn plan_split(
    quantity: Decimal,
    price: Decimal,
    side: Side,
    profile: &VenueProfile,
) -> SplitPlan {
    let Some(split) = profile.split_for(side) else {
        return SplitPlan::single(quantity);
    };

    let notional = price * quantity;
    let base = (notional / split.threshold)
        .round()
        .max(Decimal::ONE)
        .to_u32()
        .unwrap_or(u32::MAX);
    let count = base.saturating_add(split.bias);

    SplitPlan {
        count,
        chunk_amount: quantity / Decimal::from(count),
        pacing: split.pacing(),
        sweep_residual: side == Side::Sell,
    }
}
