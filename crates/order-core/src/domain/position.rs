//! 포지션 타입.
//!
//! [`RawPosition`]은 어댑터가 거래소 응답에서 추려낸 원시 포지션 항목이고,
//! [`PositionSnapshot`]은 마켓 변형별 분류를 거친 롱/숏 보유량입니다.
//! 스냅샷은 요청 시점마다 실시간 조회로 새로 계산되며 캐시되지 않습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 원시 포지션 항목의 방향 태그.
///
/// 헤지 모드 거래소는 LONG/SHORT 태그를, 원웨이 모드의 인버스 계열은
/// 부호 있는 수량과 함께 `Both`를 반환합니다. 통합 포지션 목록을 주는
/// 거래소(리니어)는 명시적 방향 필드를 Long/Short로 매핑합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RawPositionSide {
    Long,
    Short,
    Both,
}

/// 어댑터가 반환하는 원시 포지션 항목.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPosition {
    pub symbol: String,
    /// 계약 수량. `Both` 태그에서는 부호가 방향을 나타냄
    pub contracts: Decimal,
    pub side: RawPositionSide,
}

impl RawPosition {
    pub fn new(symbol: impl Into<String>, contracts: Decimal, side: RawPositionSide) -> Self {
        Self {
            symbol: symbol.into(),
            contracts,
            side,
        }
    }
}

/// 요청 시점의 롱/숏 보유량 스냅샷.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub long_contracts: Option<Decimal>,
    pub short_contracts: Option<Decimal>,
}

impl PositionSnapshot {
    /// 롱/숏 모두 비어 있는지 여부.
    pub fn is_empty(&self) -> bool {
        self.long_contracts.is_none() && self.short_contracts.is_none()
    }

    /// 0이 아닌 롱 보유량.
    pub fn long(&self) -> Option<Decimal> {
        self.long_contracts.filter(|c| !c.is_zero())
    }

    /// 0이 아닌 숏 보유량.
    pub fn short(&self) -> Option<Decimal> {
        self.short_contracts.filter(|c| !c.is_zero())
    }
}
