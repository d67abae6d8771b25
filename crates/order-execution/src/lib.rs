//! 시장가 주문 실행 파이프라인.
//!
//! 주문 의도를 받아 수량을 확정하고([`sizer`]), 선물 청산이면 반대편
//! 포지션을 조회하고([`resolver`]), 현물이면 분할 계획을 세워([`splitter`])
//! 재시도와 함께 순차 제출하는 흐름을 [`session::TradingSession`]이
//! 조립합니다.
//!
//! # 흐름
//!
//! ```text
//! MarketOrderIntent
//!        │ prepare (메타데이터, 정밀도, 마켓 변형 고정)
//!        ▼
//! OrderSizer ──(청산 percent)──▶ PositionResolver
//!        │
//!        ├─ 현물: plan_split → 청크 순차 제출 (재시도 + 간격)
//!        └─ 선물: 단일 제출 (레버리지/포지션 방향 파라미터)
//!        ▼
//! ExecutionReport (접수 순서의 영수증 목록)
//! ```

pub mod resolver;
pub mod session;
pub mod sizer;
pub mod splitter;

pub use resolver::PositionResolver;
pub use session::{ExecutionReport, PipelineStage, PreparedIntent, TradingSession};
pub use sizer::{OrderSizer, SizedOrder};
pub use splitter::{plan_split, SplitPlan};
