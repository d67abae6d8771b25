//! 모의 거래소 페이퍼 트레이딩 데모.
//!
//! ```bash
//! cargo run -p order-execution --example paper_session
//! ```

use std::sync::Arc;

use rust_decimal_macros::dec;

use order_core::{MarketMetadata, MarketOrderIntent, Side};
use order_exchange::{SimulatedAdapter, VenueProfile};
use order_execution::TradingSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let adapter = Arc::new(
        SimulatedAdapter::new("paper")
            .with_market(MarketMetadata::spot("BTC/KRW", "BTC", "KRW", 8))
            .with_price("BTC/KRW", dec!(50000000))
            .with_balance("KRW", dec!(300000), dec!(300000)),
    );
    let session = TradingSession::new(adapter.clone(), VenueProfile::krw_spot());

    let intent =
        MarketOrderIntent::new("BTC/KRW", "BTC", "KRW", Side::Buy).with_percent(dec!(30));
    let report = session.market_buy(intent).await?;

    println!("접수 주문 {}건", report.receipts.len());
    for receipt in &report.receipts {
        println!("  {} {} {}", receipt.order_id, receipt.side, receipt.amount);
    }
    println!("남은 KRW 잔고: {}", adapter.free_balance_of("KRW").await);
    println!("BTC 보유량: {}", adapter.free_balance_of("BTC").await);

    Ok(())
}
