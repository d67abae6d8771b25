//! 즉시 체결 모의 거래소.
//!
//! 실제 거래소 연결 없이 파이프라인 전체를 구동하기 위한
//! [`ExchangeAdapter`] 구현입니다. 현물 주문은 내부 잔고 장부에 즉시
//! 반영되므로, 분할 매도의 마지막 청크가 수행하는 실시간 잔고 재조회
//! 의미론을 테스트에서 그대로 관찰할 수 있습니다.
//!
//! 실패 시나리오는 두 가지 손잡이로 연출합니다:
//! - [`fail_next_orders`](SimulatedAdapter::fail_next_orders): 다음 N건의
//!   제출을 실패시킴 (일시 장애)
//! - [`fail_after_successes`](SimulatedAdapter::fail_after_successes):
//!   성공 N건 이후의 모든 제출을 실패시킴 (분할 도중 중단)

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::RwLock;

use order_core::{
    AdapterError, ExchangeAdapter, MarketKind, MarketMetadata, OrderReceipt, OrderRequest,
    RawPosition, Side, TradeFill,
};

#[derive(Debug, Clone, Copy, Default)]
struct AssetBalance {
    free: Decimal,
    total: Decimal,
}

#[derive(Default)]
struct SimState {
    markets: HashMap<String, MarketMetadata>,
    prices: HashMap<String, Decimal>,
    balances: HashMap<String, AssetBalance>,
    positions: Vec<RawPosition>,
    orders: Vec<OrderRequest>,
    receipts: Vec<OrderReceipt>,
    fills: Vec<TradeFill>,
    leverage_calls: Vec<(u32, String)>,
    /// create_order 호출 수 (실패 포함)
    submissions: u64,
    fail_next: u32,
    fail_after: Option<u64>,
    next_order_seq: u64,
}

/// 모의 거래소 어댑터.
pub struct SimulatedAdapter {
    venue: String,
    state: RwLock<SimState>,
}

impl SimulatedAdapter {
    pub fn new(venue: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            state: RwLock::new(SimState::default()),
        }
    }

    /// 마켓 등록.
    pub fn with_market(mut self, metadata: MarketMetadata) -> Self {
        let state = self.state.get_mut();
        state.markets.insert(metadata.symbol.clone(), metadata);
        self
    }

    /// 현재가 설정.
    pub fn with_price(mut self, symbol: impl Into<String>, price: Decimal) -> Self {
        self.state.get_mut().prices.insert(symbol.into(), price);
        self
    }

    /// 잔고 시드.
    pub fn with_balance(mut self, asset: impl Into<String>, free: Decimal, total: Decimal) -> Self {
        self.state
            .get_mut()
            .balances
            .insert(asset.into(), AssetBalance { free, total });
        self
    }

    /// 포지션 시드.
    pub fn with_position(mut self, position: RawPosition) -> Self {
        self.state.get_mut().positions.push(position);
        self
    }

    /// 다음 `count`건의 주문 제출을 실패시킵니다.
    pub fn fail_next_orders(mut self, count: u32) -> Self {
        self.state.get_mut().fail_next = count;
        self
    }

    /// 성공 `successes`건 이후의 모든 주문 제출을 실패시킵니다.
    pub fn fail_after_successes(mut self, successes: u64) -> Self {
        self.state.get_mut().fail_after = Some(successes);
        self
    }

    // ==================== 검증용 조회 ====================

    /// 지금까지 접수된 주문 요청 (성공분만).
    pub async fn orders(&self) -> Vec<OrderRequest> {
        self.state.read().await.orders.clone()
    }

    /// create_order 호출 수 (실패 포함).
    pub async fn submission_count(&self) -> u64 {
        self.state.read().await.submissions
    }

    /// set_leverage 호출 기록.
    pub async fn leverage_calls(&self) -> Vec<(u32, String)> {
        self.state.read().await.leverage_calls.clone()
    }

    /// 현재 가용 잔고.
    pub async fn free_balance_of(&self, asset: &str) -> Decimal {
        self.state
            .read()
            .await
            .balances
            .get(asset)
            .map(|b| b.free)
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExchangeAdapter for SimulatedAdapter {
    async fn load_market(&self, symbol: &str) -> Result<MarketMetadata, AdapterError> {
        self.state
            .read()
            .await
            .markets
            .get(symbol)
            .cloned()
            .ok_or_else(|| AdapterError::Api(format!("알 수 없는 심볼: {symbol}")))
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, AdapterError> {
        self.state
            .read()
            .await
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| AdapterError::Api(format!("시세 없음: {symbol}")))
    }

    async fn fetch_free_balance(&self, asset: &str) -> Result<Option<Decimal>, AdapterError> {
        Ok(self.state.read().await.balances.get(asset).map(|b| b.free))
    }

    async fn fetch_total_balance(&self, asset: &str) -> Result<Option<Decimal>, AdapterError> {
        Ok(self
            .state
            .read()
            .await
            .balances
            .get(asset)
            .map(|b| b.total))
    }

    async fn fetch_positions(&self, symbol: &str) -> Result<Vec<RawPosition>, AdapterError> {
        Ok(self
            .state
            .read()
            .await
            .positions
            .iter()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect())
    }

    async fn set_leverage(&self, leverage: u32, symbol: &str) -> Result<(), AdapterError> {
        self.state
            .write()
            .await
            .leverage_calls
            .push((leverage, symbol.to_string()));
        Ok(())
    }

    async fn amount_to_precision(
        &self,
        symbol: &str,
        amount: Decimal,
    ) -> Result<Decimal, AdapterError> {
        let precision = self
            .state
            .read()
            .await
            .markets
            .get(symbol)
            .map(|m| m.amount_precision)
            .ok_or_else(|| AdapterError::Api(format!("알 수 없는 심볼: {symbol}")))?;
        // 절단 방식: 올림은 잔고 초과 주문을 만든다
        Ok(amount.round_dp_with_strategy(precision, RoundingStrategy::ToZero))
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<OrderReceipt, AdapterError> {
        let mut state = self.state.write().await;
        state.submissions += 1;

        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(AdapterError::Network("모의 네트워크 오류".to_string()));
        }
        if let Some(after) = state.fail_after {
            if state.receipts.len() as u64 >= after {
                return Err(AdapterError::Api("모의 주문 거부".to_string()));
            }
        }

        let price = match request.price {
            Some(price) => price,
            None => state
                .prices
                .get(&request.symbol)
                .copied()
                .ok_or_else(|| AdapterError::Api(format!("시세 없음: {}", request.symbol)))?,
        };

        let is_spot = state
            .markets
            .get(&request.symbol)
            .map(|m| m.kind == MarketKind::Spot)
            .unwrap_or(true);

        // 현물은 즉시 체결로 잔고 장부에 반영
        if is_spot {
            let (base, quote) = state
                .markets
                .get(&request.symbol)
                .map(|m| (m.base.clone(), m.quote.clone()))
                .ok_or_else(|| AdapterError::Api(format!("알 수 없는 심볼: {}", request.symbol)))?;
            let notional = request.amount * price;

            match request.side {
                Side::Buy => {
                    let quote_balance = state.balances.entry(quote).or_default();
                    if quote_balance.free < notional {
                        return Err(AdapterError::Api("잔고 부족".to_string()));
                    }
                    quote_balance.free -= notional;
                    quote_balance.total -= notional;
                    let base_balance = state.balances.entry(base).or_default();
                    base_balance.free += request.amount;
                    base_balance.total += request.amount;
                }
                Side::Sell => {
                    let base_balance = state.balances.entry(base).or_default();
                    if base_balance.free < request.amount {
                        return Err(AdapterError::Api("잔고 부족".to_string()));
                    }
                    base_balance.free -= request.amount;
                    base_balance.total -= request.amount;
                    let quote_balance = state.balances.entry(quote).or_default();
                    quote_balance.free += notional;
                    quote_balance.total += notional;
                }
            }
        }

        state.next_order_seq += 1;
        let receipt = OrderReceipt {
            order_id: format!("SIM_{:06}", state.next_order_seq),
            symbol: request.symbol.clone(),
            side: request.side,
            amount: request.amount,
            price: Some(price),
            filled: Some(request.amount),
            created_at: Utc::now(),
        };

        state.orders.push(request.clone());
        state.fills.push(TradeFill {
            order_id: receipt.order_id.clone(),
            symbol: receipt.symbol.clone(),
            side: receipt.side,
            price,
            amount: receipt.amount,
            executed_at: receipt.created_at,
        });
        state.receipts.push(receipt.clone());

        Ok(receipt)
    }

    async fn fetch_order(
        &self,
        order_id: &str,
        _symbol: &str,
    ) -> Result<OrderReceipt, AdapterError> {
        self.state
            .read()
            .await
            .receipts
            .iter()
            .find(|r| r.order_id == order_id)
            .cloned()
            .ok_or_else(|| AdapterError::Api(format!("알 수 없는 주문: {order_id}")))
    }

    async fn fetch_my_trades(&self, symbol: &str) -> Result<Vec<TradeFill>, AdapterError> {
        Ok(self
            .state
            .read()
            .await
            .fills
            .iter()
            .filter(|f| f.symbol == symbol)
            .cloned()
            .collect())
    }

    fn venue_name(&self) -> &str {
        &self.venue
    }
}
