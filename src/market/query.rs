// region:    --- Imports
use crate::market::model::{FilterConfig, GameFilter, SortBy};

// endregion: --- Imports

// region:    --- Query Constants

/// 마켓플레이스 조회 임베디드 조인 (판매자 프로필 비정규화 표시용)
pub const TRADE_SELECT: &str = "*,profiles(username,verified,rating,total_trades)";

/// 마켓플레이스 검색 페이지 크기
pub const MARKET_PAGE_SIZE: u32 = 50;

/// 추천 판매글 페이지 크기
pub const FEATURED_PAGE_SIZE: u32 = 8;

// endregion: --- Query Constants

// region:    --- Query Plan

/// 게이트웨이 읽기 쿼리 하나에 대한 기술
///
/// 파라미터 렌더링은 결정적이며 순서가 고정된다 (테스트에서 비교 가능).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub params: Vec<(&'static str, String)>,
}

impl QueryPlan {
    /// 특정 키의 조건 값 목록
    pub fn values_of(&self, key: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// 필터/정렬 선택을 마켓플레이스 쿼리 하나로 변환
///
/// 기본값이 아닌 선택만 조건을 만든다. status=active는 항상 포함.
pub fn market_query(config: &FilterConfig) -> QueryPlan {
    let mut params: Vec<(&'static str, String)> = vec![
        ("select", TRADE_SELECT.to_string()),
        ("status", "eq.active".to_string()),
    ];

    // 카테고리 필터 (All은 조건 생략)
    if let GameFilter::Only(game) = config.game {
        params.push(("game", format!("eq.{}", game.as_str())));
    }

    // 가격대 필터 (반개구간, all은 조건 생략)
    let (lo, hi) = config.price.bounds();
    if let Some(lo) = lo {
        params.push(("price_robux", format!("gte.{}", lo)));
    }
    if let Some(hi) = hi {
        params.push(("price_robux", format!("lt.{}", hi)));
    }

    // trending 정렬은 trending=true 조건을 추가로 건다
    if config.sort == SortBy::Trending {
        params.push(("trending", "eq.true".to_string()));
    }

    params.push(("order", order_param(config.sort).to_string()));
    params.push(("limit", MARKET_PAGE_SIZE.to_string()));

    QueryPlan { params }
}

/// 추천 판매글 쿼리 (활성 + trending, 최신순 8건)
pub fn featured_query() -> QueryPlan {
    QueryPlan {
        params: vec![
            ("select", TRADE_SELECT.to_string()),
            ("status", "eq.active".to_string()),
            ("trending", "eq.true".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", FEATURED_PAGE_SIZE.to_string()),
        ],
    }
}

/// 판매자 본인 판매글 쿼리 (최신순, 제한 없음)
pub fn owner_query(seller_id: &str) -> QueryPlan {
    QueryPlan {
        params: vec![
            ("select", "*".to_string()),
            ("seller_id", format!("eq.{}", seller_id)),
            ("order", "created_at.desc".to_string()),
        ],
    }
}

/// 단일 판매글 조회 쿼리
pub fn trade_by_id_query(id: &str) -> QueryPlan {
    QueryPlan {
        params: vec![
            ("select", TRADE_SELECT.to_string()),
            ("id", format!("eq.{}", id)),
            ("limit", "1".to_string()),
        ],
    }
}

fn order_param(sort: SortBy) -> &'static str {
    match sort {
        SortBy::Newest | SortBy::Trending => "created_at.desc",
        SortBy::Oldest => "created_at.asc",
        SortBy::PriceLow => "price_robux.asc",
        SortBy::PriceHigh => "price_robux.desc",
    }
}

// endregion: --- Query Plan

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::model::{Game, PriceRange};

    fn config(game: GameFilter, sort: SortBy, price: PriceRange) -> FilterConfig {
        FilterConfig { game, sort, price }
    }

    /// 기본 선택은 status 조건과 정렬, 페이지 크기만 만든다
    #[test]
    fn default_config_has_only_implicit_predicates() {
        let plan = market_query(&FilterConfig::default());
        assert_eq!(plan.values_of("status"), vec!["eq.active"]);
        assert!(plan.values_of("game").is_empty());
        assert!(plan.values_of("price_robux").is_empty());
        assert!(plan.values_of("trending").is_empty());
        assert_eq!(plan.values_of("order"), vec!["created_at.desc"]);
        assert_eq!(plan.values_of("limit"), vec!["50"]);
    }

    /// 모든 조합에 대해 기본값이 아닌 선택만 조건을 만든다
    #[test]
    fn predicates_only_for_non_default_selections() {
        let games = [GameFilter::All, GameFilter::Only(Game::AdoptMe)];
        let sorts = [
            SortBy::Newest,
            SortBy::Oldest,
            SortBy::PriceLow,
            SortBy::PriceHigh,
            SortBy::Trending,
        ];
        for game in games {
            for sort in sorts {
                for price in PriceRange::ALL_RANGES {
                    let plan = market_query(&config(game, sort, price));

                    assert_eq!(plan.values_of("status"), vec!["eq.active"]);
                    assert_eq!(
                        plan.values_of("game").is_empty(),
                        game == GameFilter::All
                    );
                    assert_eq!(
                        plan.values_of("price_robux").is_empty(),
                        price == PriceRange::All
                    );
                    assert_eq!(
                        plan.values_of("trending").is_empty(),
                        sort != SortBy::Trending
                    );
                    assert_eq!(plan.values_of("limit"), vec!["50"]);
                }
            }
        }
    }

    /// 가격 버킷은 반개구간으로 렌더링된다
    #[test]
    fn price_buckets_render_closed_open() {
        let plan = market_query(&config(
            GameFilter::All,
            SortBy::Newest,
            PriceRange::K1To10k,
        ));
        assert_eq!(plan.values_of("price_robux"), vec!["gte.1000", "lt.10000"]);

        let plan = market_query(&config(
            GameFilter::All,
            SortBy::Newest,
            PriceRange::Under1k,
        ));
        assert_eq!(plan.values_of("price_robux"), vec!["lt.1000"]);

        let plan = market_query(&config(
            GameFilter::All,
            SortBy::Newest,
            PriceRange::Over100k,
        ));
        assert_eq!(plan.values_of("price_robux"), vec!["gte.100000"]);
    }

    /// 정렬 매핑 테스트
    #[test]
    fn sort_order_mapping() {
        assert_eq!(order_param(SortBy::Newest), "created_at.desc");
        assert_eq!(order_param(SortBy::Oldest), "created_at.asc");
        assert_eq!(order_param(SortBy::PriceLow), "price_robux.asc");
        assert_eq!(order_param(SortBy::PriceHigh), "price_robux.desc");
        // trending은 최신순 정렬에 trending 조건을 더한 것
        let plan = market_query(&config(
            GameFilter::All,
            SortBy::Trending,
            PriceRange::All,
        ));
        assert_eq!(plan.values_of("trending"), vec!["eq.true"]);
        assert_eq!(plan.values_of("order"), vec!["created_at.desc"]);
    }

    /// 카테고리 조건은 정확 일치로 렌더링된다
    #[test]
    fn category_renders_exact_match() {
        let plan = market_query(&config(
            GameFilter::Only(Game::MurderMystery2),
            SortBy::Newest,
            PriceRange::All,
        ));
        assert_eq!(plan.values_of("game"), vec!["eq.Murder Mystery 2"]);
    }

    /// 추천/판매자 쿼리 형태 테스트
    #[test]
    fn featured_and_owner_plans() {
        let featured = featured_query();
        assert_eq!(featured.values_of("trending"), vec!["eq.true"]);
        assert_eq!(featured.values_of("limit"), vec!["8"]);

        let own = owner_query("seller-1");
        assert_eq!(own.values_of("seller_id"), vec!["eq.seller-1"]);
        assert_eq!(own.values_of("order"), vec!["created_at.desc"]);
        assert!(own.values_of("limit").is_empty());
    }
}

// endregion: --- Tests
