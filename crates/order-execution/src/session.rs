//! 트레이딩 세션.
//!
//! 어댑터 하나와 포지션 모드를 소유하고 네 가지 거래 오퍼레이션을
//! 노출합니다: 현물 `market_buy`/`market_sell`(사이징 → 분할 제출),
//! 선물 `market_entry`/`market_close`(사이징 → 단일 제출).
//!
//! 오퍼레이션 하나가 의도 하나를 끝까지 처리합니다. 의도는 `prepare`
//! 이후 불변이며, 단계 산출물은 [`SizedOrder`]와 [`ExecutionReport`]로
//! 전달됩니다. 세션 하나를 여러 오퍼레이션이 동시에 공유하는 것은
//! 지원하지 않습니다. 진행 중인 재시도를 중단시키는 취소 수단은 없으며,
//! 중단은 청크 사이 또는 재시도 사이에서만 가능합니다.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use order_core::{
    ExchangeAdapter, MarketMetadata, MarketOrderIntent, OrderReceipt, OrderRequest, PositionMode,
    PositionSide, Side, TradeError, TradeFill,
};
use order_exchange::{submit_with_retry, MarketVariant, RetryPolicy, VenueProfile};

use crate::sizer::{OrderSizer, SizedOrder};
use crate::splitter::plan_split;

// =============================================================================
// 파이프라인 상태
// =============================================================================

/// 의도별 파이프라인 단계.
///
/// Created → Sized → (PositionResolved, 청산 한정) → Submitting →
/// Completed | Failed 순서로만 진행하며 이전 단계로 돌아가지 않습니다.
/// 구조화 로그의 `stage` 필드로 기록됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Created,
    Sized,
    PositionResolved,
    Submitting,
    Completed,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Sized => write!(f, "sized"),
            Self::PositionResolved => write!(f, "position-resolved"),
            Self::Submitting => write!(f, "submitting"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// =============================================================================
// 준비된 의도 / 실행 보고
// =============================================================================

/// 준비된 주문 의도.
///
/// 마켓 메타데이터가 조회되고, 수량 정밀도와 계약 단위가 고정되고,
/// 마켓 변형이 한 번 유도된 상태입니다.
#[derive(Debug, Clone)]
pub struct PreparedIntent {
    pub intent: MarketOrderIntent,
    pub metadata: MarketMetadata,
    pub variant: MarketVariant,
}

/// 오퍼레이션 실행 보고.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// 사이징 결과
    pub sized: SizedOrder,
    /// 제출 순서대로의 접수 영수증
    pub receipts: Vec<OrderReceipt>,
}

impl ExecutionReport {
    /// 접수된 수량 합.
    pub fn executed_amount(&self) -> Decimal {
        self.receipts.iter().map(|r| r.amount).sum()
    }
}

// =============================================================================
// 세션
// =============================================================================

/// 트레이딩 세션.
pub struct TradingSession {
    adapter: Arc<dyn ExchangeAdapter>,
    profile: VenueProfile,
    position_mode: PositionMode,
    spot_retry: RetryPolicy,
    position_retry: RetryPolicy,
}

impl TradingSession {
    /// 새 세션 생성 (원웨이 모드 기본).
    pub fn new(adapter: Arc<dyn ExchangeAdapter>, profile: VenueProfile) -> Self {
        Self {
            adapter,
            profile,
            position_mode: PositionMode::OneWay,
            spot_retry: RetryPolicy::spot(),
            position_retry: RetryPolicy::position(),
        }
    }

    /// 포지션 모드 지정.
    pub fn with_position_mode(mut self, position_mode: PositionMode) -> Self {
        self.position_mode = position_mode;
        self
    }

    pub fn position_mode(&self) -> PositionMode {
        self.position_mode
    }

    pub fn venue_name(&self) -> &str {
        self.adapter.venue_name()
    }

    /// 의도 준비: 마켓 메타데이터 조회, 수량 정밀도 고정, 계약 단위
    /// 채택, 마켓 변형 유도.
    pub async fn prepare(&self, mut intent: MarketOrderIntent) -> Result<PreparedIntent, TradeError> {
        let metadata = self.adapter.load_market(&intent.symbol).await?;

        if let Some(amount) = intent.amount {
            intent.amount = Some(
                self.adapter
                    .amount_to_precision(&intent.symbol, amount)
                    .await?,
            );
        }

        if intent.is_futures && metadata.is_contract {
            intent.is_contract = true;
            intent.contract_size = metadata.contract_size;
        }

        let variant = MarketVariant::from_intent(&intent);
        debug!(
            venue = self.adapter.venue_name(),
            symbol = %intent.symbol,
            market = %variant.market_kind(),
            stage = %PipelineStage::Created,
            "주문 의도 준비"
        );

        Ok(PreparedIntent {
            intent,
            metadata,
            variant,
        })
    }

    /// 현물 시장가 매수.
    pub async fn market_buy(&self, intent: MarketOrderIntent) -> Result<ExecutionReport, TradeError> {
        self.execute_spot(intent).await
    }

    /// 현물 시장가 매도.
    pub async fn market_sell(
        &self,
        intent: MarketOrderIntent,
    ) -> Result<ExecutionReport, TradeError> {
        self.execute_spot(intent).await
    }

    /// 선물 진입.
    pub async fn market_entry(
        &self,
        intent: MarketOrderIntent,
    ) -> Result<ExecutionReport, TradeError> {
        let prepared = self.prepare(intent).await?;
        let intent = &prepared.intent;

        let sizer = OrderSizer::new(self.adapter.as_ref(), &self.profile);
        let sized = sizer.resolve(intent, prepared.variant).await?;
        if sized.quantity.is_zero() {
            return Err(TradeError::MinAmount);
        }
        info!(
            venue = self.adapter.venue_name(),
            symbol = %intent.symbol,
            side = %intent.side,
            quantity = %sized.quantity,
            stage = %PipelineStage::Sized,
            "진입 수량 확정"
        );

        if let Some(leverage) = intent.leverage {
            self.adapter.set_leverage(leverage, &intent.symbol).await?;
            debug!(leverage, symbol = %intent.symbol, "레버리지 설정");
        }

        let mut request =
            OrderRequest::market(intent.symbol.clone(), intent.side, sized.quantity.abs());
        if self.position_mode == PositionMode::Hedge {
            request = request.with_position_side(hedge_position_side(intent));
        }

        let receipt = self.submit_single(&prepared, request).await?;
        Ok(ExecutionReport {
            sized,
            receipts: vec![receipt],
        })
    }

    /// 선물 청산.
    ///
    /// 원웨이 모드는 `reduce_only`, 헤지 모드는 포지션 방향 파라미터로
    /// 반대편 포지션을 줄입니다.
    pub async fn market_close(
        &self,
        intent: MarketOrderIntent,
    ) -> Result<ExecutionReport, TradeError> {
        let prepared = self.prepare(intent).await?;
        let intent = &prepared.intent;

        let sizer = OrderSizer::new(self.adapter.as_ref(), &self.profile);
        let sized = sizer.resolve(intent, prepared.variant).await?;
        info!(
            venue = self.adapter.venue_name(),
            symbol = %intent.symbol,
            side = %intent.side,
            quantity = %sized.quantity,
            stage = %PipelineStage::Sized,
            "청산 수량 확정"
        );

        let mut request =
            OrderRequest::market(intent.symbol.clone(), intent.side, sized.quantity.abs());
        match self.position_mode {
            PositionMode::OneWay => request = request.reduce_only(),
            PositionMode::Hedge => {
                request = request.with_position_side(hedge_position_side(intent));
            }
        }

        let receipt = self.submit_single(&prepared, request).await?;
        Ok(ExecutionReport {
            sized,
            receipts: vec![receipt],
        })
    }

    /// 주문 체결 수량 조회.
    pub async fn order_filled_amount(
        &self,
        order_id: &str,
        symbol: &str,
    ) -> Result<Decimal, TradeError> {
        let receipt = self.adapter.fetch_order(order_id, symbol).await?;
        Ok(receipt.filled.unwrap_or(Decimal::ZERO))
    }

    /// 체결 내역 조회.
    pub async fn my_trades(&self, symbol: &str) -> Result<Vec<TradeFill>, TradeError> {
        Ok(self.adapter.fetch_my_trades(symbol).await?)
    }

    // ==================== 내부 ====================

    /// 현물 경로: 사이징 → 분할 계획 → 순차 제출.
    async fn execute_spot(&self, intent: MarketOrderIntent) -> Result<ExecutionReport, TradeError> {
        let prepared = self.prepare(intent).await?;
        let intent = &prepared.intent;

        let sizer = OrderSizer::new(self.adapter.as_ref(), &self.profile);
        let sized = sizer.resolve(intent, prepared.variant).await?;
        info!(
            venue = self.adapter.venue_name(),
            symbol = %intent.symbol,
            side = %intent.side,
            quantity = %sized.quantity,
            stage = %PipelineStage::Sized,
            "주문 수량 확정"
        );

        let price = self.adapter.fetch_price(&intent.symbol).await?;
        let plan = plan_split(sized.quantity, price, intent.side, &self.profile);
        if plan.count > 1 {
            info!(
                count = plan.count,
                chunk = %plan.chunk_amount,
                pacing_secs = plan.pacing.as_secs(),
                "분할 주문 계획 수립"
            );
        }

        let mut receipts: Vec<OrderReceipt> = Vec::with_capacity(plan.count as usize);
        for index in 0..plan.count {
            let raw_amount = if plan.sweep_residual && index == plan.count - 1 {
                // 마지막 매도 청크: 앞 청크들의 절단 잔여까지 쓸어내도록
                // 잔고를 다시 읽는다
                self.live_free_balance(&intent.base).await?
            } else {
                plan.chunk_amount
            };
            let chunk_amount = self
                .adapter
                .amount_to_precision(&intent.symbol, raw_amount)
                .await?;

            let request = OrderRequest::market(intent.symbol.clone(), intent.side, chunk_amount)
                .with_price(price);

            debug!(
                chunk = index + 1,
                total = plan.count,
                amount = %chunk_amount,
                stage = %PipelineStage::Submitting,
                "청크 제출"
            );
            match submit_with_retry(&self.spot_retry, || self.adapter.create_order(&request)).await
            {
                Ok(receipt) => {
                    info!(
                        order_id = %receipt.order_id,
                        chunk = index + 1,
                        total = plan.count,
                        "청크 주문 접수"
                    );
                    receipts.push(receipt);
                }
                Err(cause) => {
                    // 체결된 청크는 되돌리지 않는다. 영수증과 함께 실패를 전파
                    warn!(
                        chunk = index + 1,
                        total = plan.count,
                        executed = receipts.len(),
                        stage = %PipelineStage::Failed,
                        "청크 주문 실패, 잔여 청크 중단"
                    );
                    return Err(TradeError::OrderFailed {
                        cause,
                        intent: Box::new(prepared.intent.clone()),
                        executed: receipts,
                        attempts: self.spot_retry.max_attempts,
                    });
                }
            }

            if plan.count > 1 && index + 1 < plan.count {
                tokio::time::sleep(plan.pacing).await;
            }
        }

        info!(
            orders = receipts.len(),
            stage = %PipelineStage::Completed,
            "주문 실행 완료"
        );
        Ok(ExecutionReport { sized, receipts })
    }

    /// 단일 주문 제출 (선물 경로).
    async fn submit_single(
        &self,
        prepared: &PreparedIntent,
        request: OrderRequest,
    ) -> Result<OrderReceipt, TradeError> {
        debug!(
            symbol = %request.symbol,
            amount = %request.amount,
            reduce_only = request.reduce_only,
            position_side = ?request.position_side,
            stage = %PipelineStage::Submitting,
            "주문 제출"
        );
        match submit_with_retry(&self.position_retry, || self.adapter.create_order(&request)).await
        {
            Ok(receipt) => {
                info!(
                    order_id = %receipt.order_id,
                    stage = %PipelineStage::Completed,
                    "주문 접수"
                );
                Ok(receipt)
            }
            Err(cause) => {
                warn!(stage = %PipelineStage::Failed, "주문 제출 실패");
                Err(TradeError::OrderFailed {
                    cause,
                    intent: Box::new(prepared.intent.clone()),
                    executed: Vec::new(),
                    attempts: self.position_retry.max_attempts,
                })
            }
        }
    }

    /// 실시간 가용 잔고 조회. 비어 있거나 0이면 에러.
    async fn live_free_balance(&self, asset: &str) -> Result<Decimal, TradeError> {
        match self.adapter.fetch_free_balance(asset).await? {
            Some(balance) if !balance.is_zero() => Ok(balance),
            _ => Err(TradeError::FreeAmountNone {
                asset: asset.to_string(),
            }),
        }
    }
}

/// 헤지 모드의 포지션 방향 파라미터 유도.
///
/// 매수: 진입이면 롱, 청산이면 숏. 매도: 진입이면 숏, 청산이면 롱.
fn hedge_position_side(intent: &MarketOrderIntent) -> PositionSide {
    match intent.side {
        Side::Buy => {
            if intent.is_entry {
                PositionSide::Long
            } else {
                PositionSide::Short
            }
        }
        Side::Sell => {
            if intent.is_entry {
                PositionSide::Short
            } else {
                PositionSide::Long
            }
        }
    }
}
