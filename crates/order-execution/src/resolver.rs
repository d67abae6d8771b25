//! 청산 대상 포지션 조회.
//!
//! 선물 청산 주문이 참조할 반대편 보유량을 실시간 포지션 조회로
//! 결정합니다. 분류 규칙 자체는 마켓 변형([`MarketVariant`])이 갖고
//! 있으며, 여기서는 에러 사다리만 책임집니다.

use rust_decimal::Decimal;
use tracing::debug;

use order_core::{ExchangeAdapter, MarketOrderIntent, PositionSnapshot, Side, TradeError};
use order_exchange::MarketVariant;

use crate::session::PipelineStage;

/// 포지션 리졸버.
pub struct PositionResolver<'a> {
    adapter: &'a dyn ExchangeAdapter,
    variant: MarketVariant,
}

impl<'a> PositionResolver<'a> {
    pub fn new(adapter: &'a dyn ExchangeAdapter, variant: MarketVariant) -> Self {
        Self { adapter, variant }
    }

    /// 심볼의 롱/숏 스냅샷 조회.
    ///
    /// # Errors
    ///
    /// - `TradeError::PositionNone`: 0이 아닌 포지션 항목이 전혀 없음
    pub async fn snapshot(&self, symbol: &str) -> Result<PositionSnapshot, TradeError> {
        let raw = self.adapter.fetch_positions(symbol).await?;
        if raw.iter().all(|p| p.contracts.is_zero()) {
            return Err(TradeError::PositionNone {
                symbol: symbol.to_string(),
            });
        }
        Ok(self.variant.classify_positions(&raw))
    }

    /// 청산 의도에 대응하는 반대편 보유량.
    ///
    /// 청산 매수는 숏 포지션을, 청산 매도는 롱 포지션을 요구합니다.
    ///
    /// # Errors
    ///
    /// - `TradeError::ShortPositionNone`: 청산 매수인데 숏 보유량이 0
    /// - `TradeError::LongPositionNone`: 청산 매도인데 롱 보유량이 0
    pub async fn closeable(&self, intent: &MarketOrderIntent) -> Result<Decimal, TradeError> {
        let snapshot = self.snapshot(&intent.symbol).await?;
        debug!(
            symbol = %intent.symbol,
            long = ?snapshot.long(),
            short = ?snapshot.short(),
            stage = %PipelineStage::PositionResolved,
            "포지션 분류 완료"
        );

        match intent.side {
            Side::Buy => snapshot.short().ok_or_else(|| TradeError::ShortPositionNone {
                symbol: intent.symbol.clone(),
            }),
            Side::Sell => snapshot.long().ok_or_else(|| TradeError::LongPositionNone {
                symbol: intent.symbol.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_core::{MarketMetadata, MarketKind, RawPosition, RawPositionSide};
    use order_exchange::SimulatedAdapter;
    use rust_decimal_macros::dec;

    fn delivery_adapter(positions: Vec<RawPosition>) -> SimulatedAdapter {
        let mut adapter = SimulatedAdapter::new("sim").with_market(MarketMetadata::contract(
            "BTC/USD",
            "BTC",
            "USD",
            MarketKind::Delivery,
            dec!(100),
            0,
        ));
        for position in positions {
            adapter = adapter.with_position(position);
        }
        adapter
    }

    fn close_intent(side: Side) -> MarketOrderIntent {
        MarketOrderIntent::new("BTC/USD", "BTC", "USD", side)
            .close()
            .coin_margined()
            .with_percent(dec!(100))
    }

    #[tokio::test]
    async fn test_close_buy_without_short_rejected() {
        // {short=0, long=3} 상태에서 청산 매수
        let adapter = delivery_adapter(vec![RawPosition::new(
            "BTC/USD",
            dec!(3),
            RawPositionSide::Long,
        )]);
        let resolver = PositionResolver::new(&adapter, MarketVariant::InverseFutures);

        let result = resolver.closeable(&close_intent(Side::Buy)).await;
        assert!(matches!(result, Err(TradeError::ShortPositionNone { .. })));
    }

    #[tokio::test]
    async fn test_close_sell_without_long_rejected() {
        // {short=2, long=0} 상태에서 청산 매도
        let adapter = delivery_adapter(vec![RawPosition::new(
            "BTC/USD",
            dec!(-2),
            RawPositionSide::Short,
        )]);
        let resolver = PositionResolver::new(&adapter, MarketVariant::InverseFutures);

        let result = resolver.closeable(&close_intent(Side::Sell)).await;
        assert!(matches!(result, Err(TradeError::LongPositionNone { .. })));
    }

    #[tokio::test]
    async fn test_no_positions_at_all() {
        let adapter = delivery_adapter(vec![]);
        let resolver = PositionResolver::new(&adapter, MarketVariant::InverseFutures);

        let result = resolver.closeable(&close_intent(Side::Sell)).await;
        assert!(matches!(result, Err(TradeError::PositionNone { .. })));
    }

    #[tokio::test]
    async fn test_zero_quantity_entries_count_as_no_position() {
        let adapter = delivery_adapter(vec![RawPosition::new(
            "BTC/USD",
            dec!(0),
            RawPositionSide::Both,
        )]);
        let resolver = PositionResolver::new(&adapter, MarketVariant::InverseFutures);

        let result = resolver.snapshot("BTC/USD").await;
        assert!(matches!(result, Err(TradeError::PositionNone { .. })));
    }

    #[tokio::test]
    async fn test_one_way_short_closeable_by_sign() {
        // 원웨이 모드: 부호 있는 순포지션 -4 → 숏 4
        let adapter = delivery_adapter(vec![RawPosition::new(
            "BTC/USD",
            dec!(-4),
            RawPositionSide::Both,
        )]);
        let resolver = PositionResolver::new(&adapter, MarketVariant::InverseFutures);

        let closeable = resolver.closeable(&close_intent(Side::Buy)).await.unwrap();
        assert_eq!(closeable, dec!(4));
    }
}
