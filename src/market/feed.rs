// region:    --- Imports
use crate::market::view::TradeCard;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Market Feed

/// 마켓플레이스 피드
///
/// 필터 변경은 진행 중인 이전 쿼리를 취소하지 않으므로 응답이 순서를 바꿔
/// 도착할 수 있다. 단조 증가 요청 토큰을 추적해 최신 토큰이 아닌 응답은
/// 버린다. 표시되는 결과는 항상 가장 최근 선택을 반영한다.
pub struct MarketFeed {
    latest: AtomicU64,
    current: RwLock<Vec<TradeCard>>,
}

impl MarketFeed {
    pub fn new() -> Self {
        MarketFeed {
            latest: AtomicU64::new(0),
            current: RwLock::new(Vec::new()),
        }
    }

    /// 새 조회 토큰 발급
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 조회 완료 반영. 토큰이 최신이 아니면 버리고 false를 반환한다.
    pub fn apply(&self, token: u64, cards: Vec<TradeCard>) -> bool {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if self.latest.load(Ordering::SeqCst) != token {
            warn!("{:<12} --> 늦게 도착한 응답 폐기: token={}", "Feed", token);
            return false;
        }
        info!(
            "{:<12} --> 피드 갱신: token={}, {}건",
            "Feed",
            token,
            cards.len()
        );
        *current = cards;
        true
    }

    /// 조회 실패 반영. 최신 토큰이면 부분/이전 데이터 없이 빈 결과로 되돌린다.
    pub fn fail(&self, token: u64) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if self.latest.load(Ordering::SeqCst) == token {
            current.clear();
        }
    }

    /// 현재 표시 중인 결과
    pub fn current(&self) -> Vec<TradeCard> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MarketFeed {
    fn default() -> Self {
        Self::new()
    }
}

// endregion: --- Market Feed

// region:    --- Tests


// endregion: --- Tests
