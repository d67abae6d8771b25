//! 마켓 변형 전략.
//!
//! 거래소/마진 방식 분기를 사이징 로직 곳곳의 플래그 검사 대신,
//! 의도 준비 시점에 한 번 선택되는 태그드 변형으로 고정합니다.

use rust_decimal::Decimal;

use order_core::{MarketKind, MarketOrderIntent, PositionSnapshot, RawPosition, RawPositionSide};

/// 마켓 변형: 현물 / 리니어 선물(무기한) / 인버스 선물(만기).
///
/// 변형에 따라 달라지는 것:
/// - 사이징이 읽는 잔고 자산 (리니어/현물은 호가 자산, 인버스는 기초 자산)
/// - 계약 환산식
/// - 원시 포지션 분류 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketVariant {
    Spot,
    LinearFutures,
    InverseFutures,
}

impl MarketVariant {
    /// 주문 의도에서 변형 유도.
    pub fn from_intent(intent: &MarketOrderIntent) -> Self {
        if !intent.is_futures {
            Self::Spot
        } else if intent.is_coinm {
            Self::InverseFutures
        } else {
            Self::LinearFutures
        }
    }

    pub fn market_kind(self) -> MarketKind {
        match self {
            Self::Spot => MarketKind::Spot,
            Self::LinearFutures => MarketKind::Swap,
            Self::InverseFutures => MarketKind::Delivery,
        }
    }

    pub fn is_futures(self) -> bool {
        self != Self::Spot
    }

    /// 원시 포지션 항목을 롱/숏 보유량으로 분류.
    ///
    /// 수량 0 항목은 버립니다. 인버스 계열의 원웨이 모드는 `Both` 태그와
    /// 부호 있는 수량으로 들어오므로 부호로 방향을 판정합니다. 리니어
    /// 계열은 통합 포지션 목록의 명시적 방향 필드가 Long/Short로 이미
    /// 매핑되어 들어옵니다. 현물은 항상 빈 스냅샷입니다.
    pub fn classify_positions(self, raw: &[RawPosition]) -> PositionSnapshot {
        let mut snapshot = PositionSnapshot::default();
        if self == Self::Spot {
            return snapshot;
        }

        for position in raw.iter().filter(|p| !p.contracts.is_zero()) {
            match position.side {
                RawPositionSide::Long => {
                    snapshot.long_contracts = Some(position.contracts.abs());
                }
                RawPositionSide::Short => {
                    snapshot.short_contracts = Some(position.contracts.abs());
                }
                RawPositionSide::Both => {
                    if position.contracts > Decimal::ZERO {
                        snapshot.long_contracts = Some(position.contracts);
                    } else {
                        snapshot.short_contracts = Some(position.contracts.abs());
                    }
                }
            }
        }

        snapshot
    }
}
