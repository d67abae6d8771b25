//! 도메인 타입 모듈.

pub mod adapter;
pub mod market;
pub mod order;
pub mod position;

pub use adapter::{AdapterError, ExchangeAdapter};
pub use market::MarketMetadata;
pub use order::{
    MarketOrderIntent, OrderKind, OrderReceipt, OrderRequest, PositionMode, PositionSide, Side,
    TradeFill,
};
pub use position::{PositionSnapshot, RawPosition, RawPositionSide};

use serde::{Deserialize, Serialize};

/// 유효 마켓 유형.
///
/// 주문 의도의 `is_futures`/`is_coinm` 조합에서 한 번 유도되어
/// 이후 파이프라인 전체가 이 태그를 기준으로 동작합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    /// 현물
    Spot,
    /// 무기한 선물 (USDT 마진)
    Swap,
    /// 인버스 선물 (코인 마진)
    Delivery,
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spot => write!(f, "spot"),
            Self::Swap => write!(f, "swap"),
            Self::Delivery => write!(f, "delivery"),
        }
    }
}
