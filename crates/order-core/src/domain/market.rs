//! 마켓 메타데이터.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MarketKind;

/// 거래소 마켓 메타데이터.
///
/// 세션 초기화 시 어댑터에서 한 번 조회되어, 수량 정밀도 고정과
/// 계약 단위(`is_contract`/`contract_size`) 채택에 사용됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMetadata {
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub kind: MarketKind,
    /// 계약 단위 마켓 여부
    pub is_contract: bool,
    /// 계약 크기 (계약 단위 마켓에서만 의미)
    pub contract_size: Option<Decimal>,
    /// 수량 소수 자릿수
    pub amount_precision: u32,
    /// 거래소 최소 주문 수량 (제공되는 경우)
    pub min_amount: Option<Decimal>,
}

impl MarketMetadata {
    /// 현물 마켓 메타데이터 생성.
    pub fn spot(
        symbol: impl Into<String>,
        base: impl Into<String>,
        quote: impl Into<String>,
        amount_precision: u32,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            base: base.into(),
            quote: quote.into(),
            kind: MarketKind::Spot,
            is_contract: false,
            contract_size: None,
            amount_precision,
            min_amount: None,
        }
    }

    /// 계약 단위 선물 마켓 메타데이터 생성.
    pub fn contract(
        symbol: impl Into<String>,
        base: impl Into<String>,
        quote: impl Into<String>,
        kind: MarketKind,
        contract_size: Decimal,
        amount_precision: u32,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            base: base.into(),
            quote: quote.into(),
            kind,
            is_contract: true,
            contract_size: Some(contract_size),
            amount_precision,
            min_amount: None,
        }
    }

    pub fn with_min_amount(mut self, min_amount: Decimal) -> Self {
        self.min_amount = Some(min_amount);
        self
    }
}
