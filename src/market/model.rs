use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 판매글 모델 (게이트웨이 trades 테이블의 행)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Trade {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub game: String,
    pub item_type: String,
    pub price_robux: i64,
    pub original_price_robux: Option<i64>,
    pub item_icon: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: String,
    #[serde(default)]
    pub trending: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    // 판매자 프로필 조인 결과 (profiles 임베디드 리소스)
    #[serde(default)]
    pub profiles: Option<SellerProfile>,
}

// 판매자 프로필 모델 (읽기 전용, 게이트웨이 profiles 테이블의 행)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SellerProfile {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    pub verified: bool,
    pub rating: f64,
    pub total_trades: i64,
}

// 신규 판매글 삽입 행 (id, status, created_at은 게이트웨이가 부여)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewTrade {
    pub seller_id: String,
    pub title: String,
    pub description: String,
    pub game: String,
    pub item_type: String,
    pub price_robux: i64,
    pub original_price_robux: Option<i64>,
    pub item_icon: String,
    pub image_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// 거래 가능한 게임 카테고리 (닫힌 집합)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Game {
    GrowAGarden,
    AdoptMe,
    MurderMystery2,
    RobuxGiftCards,
    LimitedItems,
    GamePasses,
    Arsenal,
    PetSimulatorX,
    Other,
}

impl Game {
    pub const ALL: [Game; 9] = [
        Game::GrowAGarden,
        Game::AdoptMe,
        Game::MurderMystery2,
        Game::RobuxGiftCards,
        Game::LimitedItems,
        Game::GamePasses,
        Game::Arsenal,
        Game::PetSimulatorX,
        Game::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Game::GrowAGarden => "Grow A Garden",
            Game::AdoptMe => "Adopt Me",
            Game::MurderMystery2 => "Murder Mystery 2",
            Game::RobuxGiftCards => "Robux & Gift Cards",
            Game::LimitedItems => "Limited Items",
            Game::GamePasses => "Game Passes",
            Game::Arsenal => "Arsenal",
            Game::PetSimulatorX => "Pet Simulator X",
            Game::Other => "Other",
        }
    }

    /// 카테고리 문자열 파싱 (닫힌 집합 밖의 값은 None)
    pub fn parse(s: &str) -> Option<Game> {
        Game::ALL.iter().copied().find(|g| g.as_str() == s)
    }
}

/// 마켓플레이스 카테고리 필터 ("All"은 조건 자체를 생략)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameFilter {
    #[default]
    All,
    Only(Game),
}

impl GameFilter {
    /// category 쿼리 파라미터 파싱 (파라미터 부재는 All)
    pub fn parse(s: Option<&str>) -> Option<GameFilter> {
        match s {
            None | Some("All") => Some(GameFilter::All),
            Some(s) => Game::parse(s).map(GameFilter::Only),
        }
    }

    /// 공유 가능한 URL의 category 파라미터 (All은 생략)
    pub fn share_param(&self) -> Option<&'static str> {
        match self {
            GameFilter::All => None,
            GameFilter::Only(g) => Some(g.as_str()),
        }
    }
}

/// 정렬 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
    Trending,
}

impl SortBy {
    pub fn parse(s: Option<&str>) -> Option<SortBy> {
        match s {
            None | Some("newest") => Some(SortBy::Newest),
            Some("oldest") => Some(SortBy::Oldest),
            Some("price_low") => Some(SortBy::PriceLow),
            Some("price_high") => Some(SortBy::PriceHigh),
            Some("trending") => Some(SortBy::Trending),
            Some(_) => None,
        }
    }
}

/// 가격대 필터 버킷
///
/// 경계 소유 규칙: 반개구간 \[하한, 상한). 1,000은 K1To10k에만,
/// 10,000은 K10To100k에만, 100,000은 Over100k에만 속한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceRange {
    #[default]
    All,
    Under1k,
    K1To10k,
    K10To100k,
    Over100k,
}

impl PriceRange {
    pub const ALL_RANGES: [PriceRange; 5] = [
        PriceRange::All,
        PriceRange::Under1k,
        PriceRange::K1To10k,
        PriceRange::K10To100k,
        PriceRange::Over100k,
    ];

    pub fn parse(s: Option<&str>) -> Option<PriceRange> {
        match s {
            None | Some("all") => Some(PriceRange::All),
            Some("under1k") => Some(PriceRange::Under1k),
            Some("1k-10k") => Some(PriceRange::K1To10k),
            Some("10k-100k") => Some(PriceRange::K10To100k),
            Some("over100k") => Some(PriceRange::Over100k),
            Some(_) => None,
        }
    }

    /// (포함 하한, 배타 상한)
    pub fn bounds(&self) -> (Option<i64>, Option<i64>) {
        match self {
            PriceRange::All => (None, None),
            PriceRange::Under1k => (None, Some(1_000)),
            PriceRange::K1To10k => (Some(1_000), Some(10_000)),
            PriceRange::K10To100k => (Some(10_000), Some(100_000)),
            PriceRange::Over100k => (Some(100_000), None),
        }
    }

    pub fn contains(&self, price: i64) -> bool {
        let (lo, hi) = self.bounds();
        lo.map_or(true, |lo| price >= lo) && hi.map_or(true, |hi| price < hi)
    }
}

/// 마켓플레이스 필터/정렬 선택 (불변 구성, 변경 시마다 쿼리 하나로 재계산)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterConfig {
    pub game: GameFilter,
    pub sort: SortBy,
    pub price: PriceRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 카테고리 파라미터 왕복 테스트
    #[test]
    fn category_param_round_trips() {
        for game in Game::ALL {
            let filter = GameFilter::parse(Some(game.as_str())).unwrap();
            assert_eq!(filter.share_param(), Some(game.as_str()));
        }
        // All과 파라미터 부재는 동일하며 파라미터를 생략한다
        assert_eq!(GameFilter::parse(None), Some(GameFilter::All));
        assert_eq!(GameFilter::parse(Some("All")), Some(GameFilter::All));
        assert_eq!(GameFilter::All.share_param(), None);
    }

    /// 닫힌 집합 밖의 카테고리 거부 테스트
    #[test]
    fn unknown_category_rejected() {
        assert_eq!(GameFilter::parse(Some("Bloxburg")), None);
        assert_eq!(Game::parse("adopt me"), None);
    }

    /// 가격 버킷 경계 소유 테스트: 경계값은 정확히 하나의 버킷에 속한다
    #[test]
    fn price_bucket_boundaries_are_deterministic() {
        for price in [1_000, 10_000, 100_000] {
            let owners: Vec<PriceRange> = PriceRange::ALL_RANGES
                .into_iter()
                .filter(|r| *r != PriceRange::All && r.contains(price))
                .collect();
            assert_eq!(owners.len(), 1, "price {} owned by {:?}", price, owners);
        }
        assert!(PriceRange::K1To10k.contains(1_000));
        assert!(!PriceRange::Under1k.contains(1_000));
        assert!(PriceRange::K10To100k.contains(10_000));
        assert!(!PriceRange::K1To10k.contains(10_000));
        assert!(PriceRange::Over100k.contains(100_000));
        assert!(!PriceRange::K10To100k.contains(100_000));
    }

    /// 정렬/가격대 파라미터 파싱 테스트
    #[test]
    fn sort_and_price_range_parsing() {
        assert_eq!(SortBy::parse(None), Some(SortBy::Newest));
        assert_eq!(SortBy::parse(Some("price_high")), Some(SortBy::PriceHigh));
        assert_eq!(SortBy::parse(Some("hot")), None);
        assert_eq!(PriceRange::parse(Some("1k-10k")), Some(PriceRange::K1To10k));
        assert_eq!(PriceRange::parse(Some("cheap")), None);
    }
}
