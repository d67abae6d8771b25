//! 거래소 어댑터 추상화.
//!
//! 시세, 잔고, 포지션 조회와 주문 제출을 위한 거래소 중립 인터페이스를
//! 제공합니다. 실행 파이프라인이 거래소와 접촉하는 유일한 경계이며,
//! 이 코어는 직접 네트워크 I/O를 수행하지 않습니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use super::{MarketMetadata, OrderReceipt, OrderRequest, RawPosition, TradeFill};

// =============================================================================
// 에러 타입
// =============================================================================

/// ExchangeAdapter 에러.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 인증 실패
    #[error("인증 실패: {0}")]
    Authentication(String),

    /// 거래소 API 에러
    #[error("API 에러: {0}")]
    Api(String),

    /// 파싱 에러
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 지원하지 않는 기능
    #[error("지원하지 않는 기능: {0}")]
    Unsupported(String),

    /// 기타 에러
    #[error("기타 에러: {0}")]
    Other(String),
}

// =============================================================================
// ExchangeAdapter Trait
// =============================================================================

/// 거래소 어댑터 trait.
///
/// 거래소/마켓 유형(현물, 리니어 선물, 인버스 선물)별로 이 trait를
/// 구현하여 실행 파이프라인을 거래소 중립적으로 유지합니다.
/// 모든 조회는 실시간이어야 합니다. 분할 주문의 뒤 청크가 앞 청크의
/// 체결 효과를 관찰해야 하므로, 잔고/포지션 응답을 의도 수명 동안
/// 캐시해서는 안 됩니다.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct BinanceSwapAdapter {
///     client: Arc<BinanceClient>,
/// }
///
/// #[async_trait]
/// impl ExchangeAdapter for BinanceSwapAdapter {
///     async fn fetch_price(&self, symbol: &str) -> Result<Decimal, AdapterError> {
///         // 거래소 ticker 조회 및 변환
///     }
///
///     // ... 나머지 메서드 구현
/// }
/// ```
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// 마켓 메타데이터 조회.
    ///
    /// 수량 정밀도, 계약 단위 여부, 계약 크기를 포함합니다.
    ///
    /// # Errors
    ///
    /// - `AdapterError::Network`: 네트워크 연결 실패
    /// - `AdapterError::Api`: 알 수 없는 심볼 등 거래소 API 에러
    async fn load_market(&self, symbol: &str) -> Result<MarketMetadata, AdapterError>;

    /// 현재가 조회 (최근 체결가).
    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, AdapterError>;

    /// 가용 잔고 조회.
    ///
    /// 자산이 계좌에 없으면 `None`을 반환합니다. 0 잔고를 에러로
    /// 승격하는 것은 사이징 단계의 책임입니다.
    async fn fetch_free_balance(&self, asset: &str) -> Result<Option<Decimal>, AdapterError>;

    /// 총 잔고 조회 (가용 + 잠김).
    async fn fetch_total_balance(&self, asset: &str) -> Result<Option<Decimal>, AdapterError>;

    /// 심볼의 원시 포지션 항목 조회.
    ///
    /// 수량 0 항목의 필터링과 롱/숏 분류는 호출 측(마켓 변형)이
    /// 수행합니다. 현물 어댑터는 빈 벡터를 반환합니다.
    async fn fetch_positions(&self, symbol: &str) -> Result<Vec<RawPosition>, AdapterError>;

    /// 레버리지 설정.
    ///
    /// # Errors
    ///
    /// - `AdapterError::Unsupported`: 현물 등 레버리지 미지원 마켓
    async fn set_leverage(&self, leverage: u32, symbol: &str) -> Result<(), AdapterError>;

    /// 수량을 거래소 허용 단위로 양자화.
    ///
    /// 절단(내림) 방식이어야 합니다. 올림은 잔고 초과 주문을 만들 수
    /// 있습니다.
    async fn amount_to_precision(
        &self,
        symbol: &str,
        amount: Decimal,
    ) -> Result<Decimal, AdapterError>;

    /// 주문 제출.
    ///
    /// # Errors
    ///
    /// - `AdapterError::Api`: 잔고 부족, 최소 주문 금액 미달 등
    /// - `AdapterError::Network`: 네트워크 연결 실패
    /// - `AdapterError::Authentication`: 인증 실패
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderReceipt, AdapterError>;

    /// 주문 단건 조회.
    async fn fetch_order(&self, order_id: &str, symbol: &str)
        -> Result<OrderReceipt, AdapterError>;

    /// 체결 내역 조회.
    async fn fetch_my_trades(&self, symbol: &str) -> Result<Vec<TradeFill>, AdapterError>;

    /// 거래소 이름 반환. 로깅 및 디버깅 목적으로 사용됩니다.
    fn venue_name(&self) -> &str;
}

// =============================================================================
// 테스트
// =============================================================================
