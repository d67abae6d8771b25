//! 주문 수량 확정.
//!
//! 주문 의도의 `amount`/`percent`를 최종 거래 수량으로 변환합니다.
//! percent 사이징은 마켓 변형에 따라 읽는 잔고 자산과 계약 환산식이
//! 달라지며, 결과는 거래소 정밀도로 양자화됩니다. 모든 잔고/시세/포지션
//! 조회는 호출 시점에 실시간으로 수행됩니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use order_core::{ExchangeAdapter, MarketOrderIntent, TradeError};
use order_exchange::{MarketVariant, VenueProfile};

use crate::resolver::PositionResolver;

/// 사이징 결과.
///
/// 의도는 불변으로 유지되고, 단계 산출물은 이 값으로 다음 단계에
/// 전달됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizedOrder {
    /// 확정 수량 (계약 단위 마켓이면 계약 수)
    pub quantity: Decimal,
    /// percent 사이징 결과 기록. amount 경로에서는 None
    pub amount_by_percent: Option<Decimal>,
    /// 사이징에 사용된 시세
    pub reference_price: Option<Decimal>,
}

/// 주문 수량 사이저.
pub struct OrderSizer<'a> {
    adapter: &'a dyn ExchangeAdapter,
    profile: &'a VenueProfile,
}

impl<'a> OrderSizer<'a> {
    pub fn new(adapter: &'a dyn ExchangeAdapter, profile: &'a VenueProfile) -> Self {
        Self { adapter, profile }
    }

    /// 의도를 최종 수량으로 변환.
    ///
    /// # Errors
    ///
    /// - `TradeError::AmountPercentBoth` / `AmountPercentNone`: 의도
    ///   불변식 위반 또는 percent 사이징이 지원하지 않는 조합
    /// - `TradeError::FreeAmountNone`: 잔고 조회가 비어 있거나 0
    /// - `TradeError::PositionNone` 계열: 청산 percent 경로의 포지션 부재
    pub async fn resolve(
        &self,
        intent: &MarketOrderIntent,
        variant: MarketVariant,
    ) -> Result<SizedOrder, TradeError> {
        match (intent.amount, intent.percent) {
            (Some(_), Some(_)) => Err(TradeError::AmountPercentBoth),
            (None, None) => Err(TradeError::AmountPercentNone),
            (Some(amount), None) => self.resolve_amount(intent, amount).await,
            (None, Some(percent)) => self.resolve_percent(intent, variant, percent).await,
        }
    }

    /// 절대 수량 경로. 계약 단위 마켓이면 계약 수로 환산합니다.
    async fn resolve_amount(
        &self,
        intent: &MarketOrderIntent,
        amount: Decimal,
    ) -> Result<SizedOrder, TradeError> {
        if let (true, Some(contract_size)) = (intent.is_contract, intent.contract_size) {
            let price = self.adapter.fetch_price(&intent.symbol).await?;
            let quantity = ((amount * price) / contract_size).floor();
            return Ok(SizedOrder {
                quantity,
                amount_by_percent: None,
                reference_price: Some(price),
            });
        }

        Ok(SizedOrder {
            quantity: amount,
            amount_by_percent: None,
            reference_price: intent.price,
        })
    }

    /// percent 경로.
    async fn resolve_percent(
        &self,
        intent: &MarketOrderIntent,
        variant: MarketVariant,
        percent: Decimal,
    ) -> Result<SizedOrder, TradeError> {
        let mut reference_price = None;

        let raw = if intent.is_entry || (intent.is_spot() && intent.is_buy()) {
            match variant {
                MarketVariant::InverseFutures => {
                    // 인버스는 기초 자산 잔고 기준
                    let balance = self.sizing_balance(intent, &intent.base).await?;
                    if let (true, Some(contract_size)) = (intent.is_contract, intent.contract_size)
                    {
                        let price = self.adapter.fetch_price(&intent.symbol).await?;
                        reference_price = Some(price);
                        ((balance * percent / dec!(100) * price) / contract_size).floor()
                    } else {
                        balance * percent / dec!(100)
                    }
                }
                MarketVariant::LinearFutures => {
                    let balance = self.sizing_balance(intent, &intent.quote).await?;
                    let price = self.adapter.fetch_price(&intent.symbol).await?;
                    reference_price = Some(price);
                    if let (true, Some(contract_size)) = (intent.is_contract, intent.contract_size)
                    {
                        // 레버리지는 증거금 대비 명목가치 배수로 곱해진다
                        let leverage = Decimal::from(intent.leverage.unwrap_or(1));
                        ((balance * percent / dec!(100) * leverage) / (price * contract_size))
                            .floor()
                    } else {
                        balance * percent / dec!(100) / price
                    }
                }
                MarketVariant::Spot => {
                    let balance = self.sizing_balance(intent, &intent.quote).await?;
                    let price = self.adapter.fetch_price(&intent.symbol).await?;
                    reference_price = Some(price);
                    // 안전 마진은 잔고 반올림으로 인한 잔고 부족 거절을 피한다
                    let margin = self.profile.spot_buy_margin_pct.unwrap_or(Decimal::ZERO);
                    balance * (percent - margin) / dec!(100) / price
                }
            }
        } else if intent.is_futures && intent.is_close {
            let resolver = PositionResolver::new(self.adapter, variant);
            let closeable = resolver.closeable(intent).await?;
            closeable * percent / dec!(100)
        } else if intent.is_spot() && intent.is_sell() {
            let balance = self.sizing_balance(intent, &intent.base).await?;
            balance * percent / dec!(100)
        } else {
            return Err(TradeError::AmountPercentNone);
        };

        let quantity = self.adapter.amount_to_precision(&intent.symbol, raw).await?;
        debug!(
            symbol = %intent.symbol,
            percent = %percent,
            quantity = %quantity,
            "percent 사이징 완료"
        );

        Ok(SizedOrder {
            quantity,
            amount_by_percent: Some(quantity),
            reference_price,
        })
    }

    /// 사이징 기준 잔고 조회. `is_total`에 따라 총/가용 잔고를 읽습니다.
    async fn sizing_balance(
        &self,
        intent: &MarketOrderIntent,
        asset: &str,
    ) -> Result<Decimal, TradeError> {
        let balance = if intent.is_total {
            self.adapter.fetch_total_balance(asset).await?
        } else {
            self.adapter.fetch_free_balance(asset).await?
        };

        match balance {
            Some(value) if !value.is_zero() => Ok(value),
            _ => Err(TradeError::FreeAmountNone {
                asset: asset.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_core::{MarketKind, MarketMetadata, Side};
    use order_exchange::SimulatedAdapter;

    fn krw_spot_adapter(krw_free: Decimal) -> SimulatedAdapter {
        SimulatedAdapter::new("sim")
            .with_market(MarketMetadata::spot("BTC/KRW", "BTC", "KRW", 8))
            .with_price("BTC/KRW", dec!(100))
            .with_balance("KRW", krw_free, krw_free)
    }

    #[tokio::test]
    async fn test_both_amount_and_percent_rejected() {
        let adapter = krw_spot_adapter(dec!(1000));
        let profile = VenueProfile::krw_spot();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent = MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy)
            .with_amount(dec!(1))
            .with_percent(dec!(50));
        let result = sizer.resolve(&intent, MarketVariant::Spot).await;
        assert!(matches!(result, Err(TradeError::AmountPercentBoth)));
    }

    #[tokio::test]
    async fn test_neither_amount_nor_percent_rejected() {
        let adapter = krw_spot_adapter(dec!(1000));
        let profile = VenueProfile::krw_spot();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent = MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy);
        let result = sizer.resolve(&intent, MarketVariant::Spot).await;
        assert!(matches!(result, Err(TradeError::AmountPercentNone)));
    }

    #[tokio::test]
    async fn test_amount_contract_conversion() {
        // amount=10, price=50, contract_size=5 → floor(10*50/5) = 100 계약
        let adapter = SimulatedAdapter::new("sim")
            .with_market(MarketMetadata::contract(
                "BTC/USD",
                "BTC",
                "USD",
                MarketKind::Delivery,
                dec!(5),
                0,
            ))
            .with_price("BTC/USD", dec!(50));
        let profile = VenueProfile::usdt_futures();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent = MarketOrderIntent::new("BTC/USD", "BTC", "USD", Side::Buy)
            .entry()
            .coin_margined()
            .with_contract_size(dec!(5))
            .with_amount(dec!(10));
        let sized = sizer
            .resolve(&intent, MarketVariant::InverseFutures)
            .await
            .unwrap();
        assert_eq!(sized.quantity, dec!(100));
        assert!(sized.amount_by_percent.is_none());
    }

    #[tokio::test]
    async fn test_spot_buy_percent_with_safety_margin() {
        // percent=50, 호가 잔고 1000, 가격 100, 마진 0.5%p → 4.95
        let adapter = krw_spot_adapter(dec!(1000));
        let profile = VenueProfile::usdt_futures();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent =
            MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy).with_percent(dec!(50));
        let sized = sizer.resolve(&intent, MarketVariant::Spot).await.unwrap();
        assert_eq!(sized.quantity, dec!(4.95));
        assert_eq!(sized.amount_by_percent, Some(dec!(4.95)));
        assert_eq!(sized.reference_price, Some(dec!(100)));
    }

    #[tokio::test]
    async fn test_spot_buy_percent_without_margin() {
        let adapter = krw_spot_adapter(dec!(1000));
        let profile = VenueProfile::krw_spot();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent =
            MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy).with_percent(dec!(50));
        let sized = sizer.resolve(&intent, MarketVariant::Spot).await.unwrap();
        assert_eq!(sized.quantity, dec!(5.0));
    }

    #[tokio::test]
    async fn test_spot_sell_percent_uses_base_balance() {
        let adapter = SimulatedAdapter::new("sim")
            .with_market(MarketMetadata::spot("BTC/KRW", "BTC", "KRW", 8))
            .with_price("BTC/KRW", dec!(100))
            .with_balance("BTC", dec!(2), dec!(2));
        let profile = VenueProfile::krw_spot();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent =
            MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Sell).with_percent(dec!(50));
        let sized = sizer.resolve(&intent, MarketVariant::Spot).await.unwrap();
        assert_eq!(sized.quantity, dec!(1));
    }

    #[tokio::test]
    async fn test_inverse_entry_percent_contract() {
        // 기초 자산 1, 가격 50000, 계약 크기 100 → floor(1*50000/100) = 500 계약
        let adapter = SimulatedAdapter::new("sim")
            .with_market(MarketMetadata::contract(
                "BTC/USD",
                "BTC",
                "USD",
                MarketKind::Delivery,
                dec!(100),
                0,
            ))
            .with_price("BTC/USD", dec!(50000))
            .with_balance("BTC", dec!(1), dec!(1));
        let profile = VenueProfile::usdt_futures();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent = MarketOrderIntent::new("BTC/USD", "BTC", "USD", Side::Buy)
            .entry()
            .coin_margined()
            .with_contract_size(dec!(100))
            .with_percent(dec!(100));
        let sized = sizer
            .resolve(&intent, MarketVariant::InverseFutures)
            .await
            .unwrap();
        assert_eq!(sized.quantity, dec!(500));
    }

    #[tokio::test]
    async fn test_linear_entry_percent_applies_leverage() {
        // 호가 잔고 1000, 가격 100, 계약 크기 1, 레버리지 10 → 100 계약
        let adapter = SimulatedAdapter::new("sim")
            .with_market(MarketMetadata::contract(
                "BTC/USDT",
                "BTC",
                "USDT",
                MarketKind::Swap,
                dec!(1),
                0,
            ))
            .with_price("BTC/USDT", dec!(100))
            .with_balance("USDT", dec!(1000), dec!(1000));
        let profile = VenueProfile::usdt_futures();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent = MarketOrderIntent::new("BTC/USDT", "BTC", "USDT", Side::Buy)
            .entry()
            .with_contract_size(dec!(1))
            .with_leverage(10)
            .with_percent(dec!(100));
        let sized = sizer
            .resolve(&intent, MarketVariant::LinearFutures)
            .await
            .unwrap();
        assert_eq!(sized.quantity, dec!(100));
    }

    #[tokio::test]
    async fn test_missing_balance_raises_free_amount_none() {
        let adapter = SimulatedAdapter::new("sim")
            .with_market(MarketMetadata::spot("BTC/KRW", "BTC", "KRW", 8))
            .with_price("BTC/KRW", dec!(100));
        let profile = VenueProfile::krw_spot();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent =
            MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy).with_percent(dec!(50));
        let result = sizer.resolve(&intent, MarketVariant::Spot).await;
        assert!(matches!(result, Err(TradeError::FreeAmountNone { .. })));
    }

    #[tokio::test]
    async fn test_zero_balance_raises_free_amount_none() {
        let adapter = krw_spot_adapter(dec!(0));
        let profile = VenueProfile::krw_spot();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent =
            MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy).with_percent(dec!(50));
        let result = sizer.resolve(&intent, MarketVariant::Spot).await;
        assert!(matches!(result, Err(TradeError::FreeAmountNone { .. })));
    }

    #[tokio::test]
    async fn test_total_balance_sizing() {
        let adapter = SimulatedAdapter::new("sim")
            .with_market(MarketMetadata::spot("BTC/KRW", "BTC", "KRW", 8))
            .with_price("BTC/KRW", dec!(100))
            .with_balance("KRW", dec!(500), dec!(1000));
        let profile = VenueProfile::krw_spot();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent = MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy)
            .with_percent(dec!(50))
            .with_total_balance();
        let sized = sizer.resolve(&intent, MarketVariant::Spot).await.unwrap();
        // 총 잔고 1000 기준 → 5.0
        assert_eq!(sized.quantity, dec!(5.0));
    }

    #[tokio::test]
    async fn test_futures_percent_without_direction_rejected() {
        let adapter = SimulatedAdapter::new("sim")
            .with_market(MarketMetadata::spot("BTC/USDT", "BTC", "USDT", 8))
            .with_price("BTC/USDT", dec!(100))
            .with_balance("USDT", dec!(1000), dec!(1000));
        let profile = VenueProfile::usdt_futures();
        let sizer = OrderSizer::new(&adapter, &profile);

        // 선물인데 진입도 청산도 아닌 의도
        let mut intent =
            MarketOrderIntent::new("BTC/USDT", "BTC", "USDT", Side::Sell).with_percent(dec!(50));
        intent.is_futures = true;
        let result = sizer
            .resolve(&intent, MarketVariant::LinearFutures)
            .await;
        assert!(matches!(result, Err(TradeError::AmountPercentNone)));
    }

    #[tokio::test]
    async fn test_percent_sizing_idempotent() {
        let adapter = krw_spot_adapter(dec!(1000));
        let profile = VenueProfile::krw_spot();
        let sizer = OrderSizer::new(&adapter, &profile);

        let intent =
            MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy).with_percent(dec!(37));
        let first = sizer.resolve(&intent, MarketVariant::Spot).await.unwrap();
        let second = sizer.resolve(&intent, MarketVariant::Spot).await.unwrap();
        // 잔고/시세가 고정이면 결과도 동일
        assert_eq!(first.quantity, second.quantity);
        assert_eq!(first.amount_by_percent, second.amount_by_percent);
    }
}
