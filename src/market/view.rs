// region:    --- Imports
use crate::market::model::{SellerProfile, Trade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Trade Card

/// 렌더링된 판매글 카드
///
/// 파생 표시 값(가격 표기, 남은 시간)은 저장하지 않고 렌더 시점에 계산한다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TradeCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub game: String,
    pub item_type: String,
    pub item_icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub status: String,
    pub trending: bool,
    pub price_robux: i64,
    pub price_display: String,
    // 정가는 정보성 표시일 뿐이다 (취소선 렌더링은 브라우저 몫)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price_display: Option<String>,
    pub time_left: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<SellerProfile>,
}

/// 판매글 행을 카드로 렌더링
pub fn render_card(trade: &Trade, now: DateTime<Utc>) -> TradeCard {
    TradeCard {
        id: trade.id.clone(),
        title: trade.title.clone(),
        description: trade.description.clone(),
        game: trade.game.clone(),
        item_type: trade.item_type.clone(),
        item_icon: trade.item_icon.clone(),
        image_url: trade.image_url.clone(),
        status: trade.status.clone(),
        trending: trade.trending,
        price_robux: trade.price_robux,
        price_display: format_robux(trade.price_robux),
        original_price_display: trade.original_price_robux.map(format_robux),
        time_left: format_time_left(trade.expires_at, now),
        created_at: trade.created_at,
        seller: trade.profiles.clone(),
    }
}

// endregion: --- Trade Card

// region:    --- Local Search Filter

/// 제목/설명/게임에 대한 대소문자 무시 부분 문자열 검색
///
/// 원격 필터가 적용된 결과 위에 교집합으로만 동작한다 (2단계 필터).
pub fn matches_search(trade: &Trade, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    trade.title.to_lowercase().contains(&needle)
        || trade.description.to_lowercase().contains(&needle)
        || trade.game.to_lowercase().contains(&needle)
}

pub fn apply_search(trades: Vec<Trade>, search: &str) -> Vec<Trade> {
    trades
        .into_iter()
        .filter(|t| matches_search(t, search))
        .collect()
}

// endregion: --- Local Search Filter

// region:    --- Display Formatting

/// Robux 금액 표기 (천 단위 구분자 + "Robux" 접미사)
pub fn format_robux(amount: i64) -> String {
    format!("{} Robux", group_thousands(amount))
}

/// 남은 시간 표기
///
/// 전체 시간으로 내림한 시와 나머지 분. 만료 시각이 지났으면 "Expired",
/// 만료 시각이 없으면 "No expiry".
pub fn format_time_left(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(expires_at) = expires_at else {
        return "No expiry".to_string();
    };
    let diff = expires_at.signed_duration_since(now);
    if diff.num_seconds() <= 0 {
        return "Expired".to_string();
    }
    let hours = diff.num_hours();
    let minutes = diff.num_minutes() - hours * 60;
    format!("{}h {}m", hours, minutes)
}

fn group_thousands(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

// endregion: --- Display Formatting

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn trade(title: &str, description: &str, game: &str) -> Trade {
        Trade {
            id: "t-1".to_string(),
            seller_id: "s-1".to_string(),
            title: title.to_string(),
            description: description.to_string(),
            game: game.to_string(),
            item_type: "Pet".to_string(),
            price_robux: 15_000,
            original_price_robux: None,
            item_icon: "🐉".to_string(),
            image_url: None,
            status: "active".to_string(),
            trending: false,
            expires_at: None,
            created_at: Utc::now(),
            profiles: None,
        }
    }

    /// 남은 시간 표기 테스트
    #[test]
    fn time_left_formatting() {
        let now = Utc::now();
        assert_eq!(
            format_time_left(Some(now + Duration::minutes(90)), now),
            "1h 30m"
        );
        assert_eq!(
            format_time_left(Some(now + Duration::minutes(150)), now),
            "2h 30m"
        );
        assert_eq!(
            format_time_left(Some(now - Duration::minutes(1)), now),
            "Expired"
        );
        assert_eq!(format_time_left(Some(now), now), "Expired");
        assert_eq!(format_time_left(None, now), "No expiry");
    }

    /// 가격 표기 테스트
    #[test]
    fn robux_formatting() {
        assert_eq!(format_robux(0), "0 Robux");
        assert_eq!(format_robux(999), "999 Robux");
        assert_eq!(format_robux(15_000), "15,000 Robux");
        assert_eq!(format_robux(750_000), "750,000 Robux");
        assert_eq!(format_robux(1_234_567), "1,234,567 Robux");
    }

    /// 검색은 제목/설명/게임에 대해 대소문자를 무시한다
    #[test]
    fn search_matches_across_fields_case_insensitively() {
        let t = trade("Rare Dragon Pet", "Neon shadow variant", "Adopt Me");
        assert!(matches_search(&t, "dragon"));
        assert!(matches_search(&t, "SHADOW"));
        assert!(matches_search(&t, "adopt"));
        assert!(matches_search(&t, ""));
        assert!(!matches_search(&t, "luger"));
    }

    /// 같은 검색어로 다시 필터링해도 결과가 바뀌지 않는다 (멱등)
    #[test]
    fn search_filter_is_idempotent() {
        let trades = vec![
            trade("Rare Dragon Pet", "", "Adopt Me"),
            trade("Chroma Luger", "", "Murder Mystery 2"),
            trade("Dragon Sword", "", "Arsenal"),
        ];
        let once = apply_search(trades, "dragon");
        let twice = apply_search(once.clone(), "dragon");
        assert_eq!(once.len(), 2);
        assert_eq!(
            once.iter().map(|t| &t.title).collect::<Vec<_>>(),
            twice.iter().map(|t| &t.title).collect::<Vec<_>>()
        );
    }

    /// 카드 렌더링 테스트: 파생 필드 계산
    #[test]
    fn card_derives_display_fields() {
        let now = Utc::now();
        let mut t = trade("Rare Dragon Pet", "", "Adopt Me");
        t.expires_at = Some(now + Duration::minutes(90));
        let card = render_card(&t, now);
        assert_eq!(card.price_display, "15,000 Robux");
        assert_eq!(card.original_price_display, None);
        assert_eq!(card.time_left, "1h 30m");

        t.original_price_robux = Some(18_000);
        let card = render_card(&t, now);
        assert_eq!(
            card.original_price_display.as_deref(),
            Some("18,000 Robux")
        );
    }

    /// 정가가 없으면 직렬화에서 필드 자체가 빠진다
    #[test]
    fn absent_original_price_is_omitted_from_json() {
        let card = render_card(&trade("Rare Dragon Pet", "", "Adopt Me"), Utc::now());
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("original_price_display").is_none());
        assert_eq!(json["price_display"], "15,000 Robux");
    }
}

// endregion: --- Tests
