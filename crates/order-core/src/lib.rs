//! 시장가 주문 실행 코어의 거래소 중립 도메인 모델.
//!
//! 주문 의도([`MarketOrderIntent`]), 포지션 스냅샷, 마켓 메타데이터와
//! 거래소 어댑터 경계([`ExchangeAdapter`])를 정의합니다.
//! 거래소별 응답 형태 차이는 어댑터 구현 내부에 격리되며,
//! 상위 파이프라인(사이저, 포지션 리졸버, 분할 주문)은 이 크레이트의
//! 타입만으로 동작합니다.

pub mod domain;
pub mod error;

pub use domain::{
    AdapterError, ExchangeAdapter, MarketKind, MarketMetadata, MarketOrderIntent, OrderKind,
    OrderReceipt, OrderRequest, PositionMode, PositionSide, PositionSnapshot, RawPosition,
    RawPositionSide, Side, TradeFill,
};
pub use error::TradeError;
