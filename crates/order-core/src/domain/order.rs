//! 주문 의도와 주문 요청/응답 타입.
//!
//! [`MarketOrderIntent`]는 프런트엔드(웹훅, 스케줄러 등)와 실행 코어 사이의
//! 계약 타입입니다. 파이프라인에 전달된 이후에는 불변으로 취급되며,
//! 각 단계의 산출물은 별도의 결과 값으로 전달됩니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MarketKind;
use crate::error::TradeError;

// =============================================================================
// 기본 열거형
// =============================================================================

/// 매수/매도 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// 주문 유형. 이 코어는 시장가 주문만 처리합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Market,
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Market => write!(f, "market"),
        }
    }
}

/// 포지션 모드.
///
/// 원웨이 모드는 심볼당 순포지션 하나, 헤지 모드는 롱/숏 포지션을
/// 독립적으로 보유합니다. 세션 구성 시 한 번 결정됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionMode {
    OneWay,
    Hedge,
}

/// 헤지 모드 주문에 부착되는 포지션 방향 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

// =============================================================================
// 주문 의도
// =============================================================================

/// 시장가 주문 의도.
///
/// `amount`(절대 수량)와 `percent`(가용 잔고/포지션 대비 비율) 중
/// **정확히 하나**만 설정되어야 합니다. 두 필드가 모두 설정되거나
/// 모두 비어 있으면 사이징 단계에서 에러가 발생합니다.
///
/// 선물 의도는 `is_entry`(진입)와 `is_close`(청산) 중 하나만 참이어야 합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOrderIntent {
    /// 거래소 통합 심볼 (예: "BTC/USDT")
    pub symbol: String,
    /// 기초 자산 코드 (예: "BTC")
    pub base: String,
    /// 호가 자산 코드 (예: "USDT")
    pub quote: String,
    /// 매수/매도
    pub side: Side,
    /// 주문 유형 (시장가 고정)
    pub kind: OrderKind,
    /// 절대 수량
    pub amount: Option<Decimal>,
    /// 잔고/포지션 대비 비율 (0~100)
    pub percent: Option<Decimal>,
    /// 선물 여부
    pub is_futures: bool,
    /// 코인 마진(인버스) 여부
    pub is_coinm: bool,
    /// 계약 단위 마켓 여부
    pub is_contract: bool,
    /// 계약 크기 (`is_contract`일 때 필수)
    pub contract_size: Option<Decimal>,
    /// 레버리지 배율
    pub leverage: Option<u32>,
    /// 선물 진입 여부
    pub is_entry: bool,
    /// 선물 청산 여부
    pub is_close: bool,
    /// 가용 잔고 대신 총 잔고 기준으로 사이징할지 여부
    pub is_total: bool,
    /// 참조 가격 (분할 주문 장부 기록용, 순수 시장가 주문이면 None)
    pub price: Option<Decimal>,
}

impl MarketOrderIntent {
    /// 새 시장가 주문 의도 생성.
    pub fn new(
        symbol: impl Into<String>,
        base: impl Into<String>,
        quote: impl Into<String>,
        side: Side,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            base: base.into(),
            quote: quote.into(),
            side,
            kind: OrderKind::Market,
            amount: None,
            percent: None,
            is_futures: false,
            is_coinm: false,
            is_contract: false,
            contract_size: None,
            leverage: None,
            is_entry: false,
            is_close: false,
            is_total: false,
            price: None,
        }
    }

    /// 절대 수량 지정.
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// 비율 지정 (0~100).
    pub fn with_percent(mut self, percent: Decimal) -> Self {
        self.percent = Some(percent);
        self
    }

    /// 선물 진입 의도로 표시.
    pub fn entry(mut self) -> Self {
        self.is_futures = true;
        self.is_entry = true;
        self
    }

    /// 선물 청산 의도로 표시.
    pub fn close(mut self) -> Self {
        self.is_futures = true;
        self.is_close = true;
        self
    }

    /// 코인 마진(인버스) 마켓으로 표시.
    pub fn coin_margined(mut self) -> Self {
        self.is_coinm = true;
        self
    }

    /// 계약 단위 마켓으로 표시.
    pub fn with_contract_size(mut self, contract_size: Decimal) -> Self {
        self.is_contract = true;
        self.contract_size = Some(contract_size);
        self
    }

    /// 레버리지 지정.
    pub fn with_leverage(mut self, leverage: u32) -> Self {
        self.leverage = Some(leverage);
        self
    }

    /// 총 잔고 기준 사이징으로 전환.
    pub fn with_total_balance(mut self) -> Self {
        self.is_total = true;
        self
    }

    /// 참조 가격 지정.
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }

    pub fn is_spot(&self) -> bool {
        !self.is_futures
    }

    /// 유효 마켓 유형 유도.
    pub fn market_kind(&self) -> MarketKind {
        if !self.is_futures {
            MarketKind::Spot
        } else if self.is_coinm {
            MarketKind::Delivery
        } else {
            MarketKind::Swap
        }
    }

    /// 의도 불변식 검사.
    ///
    /// 프런트엔드는 파이프라인 호출 전에 이 검사를 통과시켜야 합니다.
    /// 사이징 단계도 동일한 검사를 다시 수행하므로, 검사를 건너뛴
    /// 의도가 코어에 도달해도 주문 제출 전에 거부됩니다.
    pub fn validate(&self) -> Result<(), TradeError> {
        match (self.amount, self.percent) {
            (Some(_), Some(_)) => return Err(TradeError::AmountPercentBoth),
            (None, None) => return Err(TradeError::AmountPercentNone),
            _ => {}
        }
        if self.is_futures && self.is_entry && self.is_close {
            return Err(TradeError::AmountPercentNone);
        }
        Ok(())
    }
}

// =============================================================================
// 주문 요청/응답
// =============================================================================

/// 어댑터에 전달되는 주문 생성 요청.
///
/// ccxt 계열 클라이언트의 `create_order` 파라미터를 타입으로 고정한 것입니다.
/// 거래소별 파라미터 명칭 변환(reduceOnly, positionSide 등)은 어댑터가
/// 담당합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub kind: OrderKind,
    pub side: Side,
    pub amount: Decimal,
    /// 참조 가격. 시장가 주문에서는 장부 기록용이며 체결가를 구속하지 않음
    pub price: Option<Decimal>,
    /// 원웨이 모드 청산 주문 표시
    pub reduce_only: bool,
    /// 헤지 모드 포지션 방향
    pub position_side: Option<PositionSide>,
}

impl OrderRequest {
    /// 시장가 주문 요청 생성.
    pub fn market(symbol: impl Into<String>, side: Side, amount: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            kind: OrderKind::Market,
            side,
            amount,
            price: None,
            reduce_only: false,
            position_side: None,
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }

    pub fn with_position_side(mut self, position_side: PositionSide) -> Self {
        self.position_side = Some(position_side);
        self
    }
}

/// 거래소가 접수한 주문의 영수증.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// 거래소 주문 ID
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    /// 접수 수량
    pub amount: Decimal,
    /// 참조/체결 가격 (거래소가 제공하는 경우)
    pub price: Option<Decimal>,
    /// 체결 수량 (거래소가 제공하는 경우)
    pub filled: Option<Decimal>,
    /// 접수 시각
    pub created_at: DateTime<Utc>,
}

/// 거래소 중립 체결 내역.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeFill {
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub amount: Decimal,
    pub executed_at: DateTime<Utc>,
}

// =============================================================================
// 테스트
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_kind_derivation() {
        let spot = MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy);
        assert_eq!(spot.market_kind(), MarketKind::Spot);

        let swap = MarketOrderIntent::new("BTC/USDT", "BTC", "USDT", Side::Buy).entry();
        assert_eq!(swap.market_kind(), MarketKind::Swap);

        let delivery = MarketOrderIntent::new("BTC/USD", "BTC", "USD", Side::Sell)
            .entry()
            .coin_margined();
        assert_eq!(delivery.market_kind(), MarketKind::Delivery);
    }

    #[test]
    fn test_validate_amount_percent_exclusive() {
        let both = MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy)
            .with_amount(dec!(1))
            .with_percent(dec!(50));
        assert!(matches!(
            both.validate(),
            Err(TradeError::AmountPercentBoth)
        ));

        let neither = MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy);
        assert!(matches!(
            neither.validate(),
            Err(TradeError::AmountPercentNone)
        ));

        let ok = MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy).with_percent(dec!(50));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_order_request_builder() {
        let request = OrderRequest::market("BTC/USDT", Side::Sell, dec!(2))
            .reduce_only()
            .with_position_side(PositionSide::Long);
        assert!(request.reduce_only);
        assert_eq!(request.position_side, Some(PositionSide::Long));
        assert_eq!(request.kind, OrderKind::Market);
        assert!(request.price.is_none());
    }
}
