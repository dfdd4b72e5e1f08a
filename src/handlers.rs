// region:    --- Imports
use crate::gateway::TradeStore;
use crate::market::feed::MarketFeed;
use crate::market::model::{FilterConfig, Game, GameFilter, NewTrade, PriceRange, SortBy};
use crate::market::query;
use crate::market::view::{self, TradeCard};
use crate::session;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- App State

pub type AppState = (Arc<dyn TradeStore>, Arc<MarketFeed>);

/// 라우터 구성
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/trades", get(handle_search_trades).post(handle_post_trade))
        .route("/trades/featured", get(handle_featured_trades))
        .route("/trades/feed", get(handle_market_feed))
        .route("/trades/:id/interest", post(handle_trade_interest))
        .route("/my/trades", get(handle_my_trades))
        .route("/my/trades/:id", delete(handle_delete_trade))
        .route("/my/profile", get(handle_my_profile))
        .route("/session", get(handle_session))
        .route("/logout", post(handle_logout))
        .with_state(state)
}

// endregion: --- App State

// region:    --- Constants

/// 이미지 업로드 상한 (5 MiB, 네트워크 호출 전에 검사)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

// endregion: --- Constants

// region:    --- Marketplace Handlers

#[derive(Debug, Deserialize)]
pub struct MarketParams {
    pub category: Option<String>,
    pub sort: Option<String>,
    pub price_range: Option<String>,
    pub q: Option<String>,
}

/// 마켓플레이스 검색 결과 페이지
#[derive(Debug, Serialize, Deserialize)]
pub struct MarketPage {
    // 공유 가능한 URL 상태: All이면 필드 자체를 생략한다
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub count: usize,
    pub trades: Vec<TradeCard>,
}

/// 마켓플레이스 검색 처리
pub async fn handle_search_trades(
    State((store, feed)): State<AppState>,
    Query(params): Query<MarketParams>,
) -> impl IntoResponse {
    info!("{:<12} --> 마켓플레이스 검색: {:?}", "Market", params);

    // 필터 선택 파싱 (닫힌 집합 밖의 값은 입력 경계에서 거부)
    let Some(game) = GameFilter::parse(params.category.as_deref()) else {
        return bad_request("Unknown game category.", "INVALID_GAME");
    };
    let Some(sort) = SortBy::parse(params.sort.as_deref()) else {
        return bad_request("Unknown sort option.", "INVALID_SORT");
    };
    let Some(price) = PriceRange::parse(params.price_range.as_deref()) else {
        return bad_request("Unknown price range.", "INVALID_PRICE_RANGE");
    };
    let config = FilterConfig { game, sort, price };

    let token = feed.issue();
    let plan = query::market_query(&config);

    match store.search_trades(&plan).await {
        Ok(trades) => {
            // 2단계 필터: 원격 결과 위에 로컬 검색 교집합
            let search = params.q.as_deref().unwrap_or("");
            let now = Utc::now();
            let cards: Vec<TradeCard> = view::apply_search(trades, search)
                .iter()
                .map(|t| view::render_card(t, now))
                .collect();
            feed.apply(token, cards.clone());
            Json(MarketPage {
                category: config.game.share_param().map(str::to_string),
                count: cards.len(),
                trades: cards,
            })
            .into_response()
        }
        Err(e) => {
            error!("{:<12} --> 판매글 조회 실패: {}", "Market", e);
            feed.fail(token);
            gateway_error("Failed to load trades. Please try again.")
        }
    }
}

/// 피드 캐시 조회 (마지막으로 반영된 검색 결과, 게이트웨이 호출 없음)
pub async fn handle_market_feed(State((_, feed)): State<AppState>) -> impl IntoResponse {
    let cards = feed.current();
    Json(serde_json::json!({ "count": cards.len(), "trades": cards }))
}

/// 추천 판매글 조회 처리
pub async fn handle_featured_trades(State((store, _)): State<AppState>) -> impl IntoResponse {
    info!("{:<12} --> 추천 판매글 조회", "Market");
    match store.search_trades(&query::featured_query()).await {
        Ok(trades) => {
            let now = Utc::now();
            let cards: Vec<TradeCard> = trades.iter().map(|t| view::render_card(t, now)).collect();
            Json(serde_json::json!({ "count": cards.len(), "trades": cards })).into_response()
        }
        Err(e) => {
            error!("{:<12} --> 추천 판매글 조회 실패: {}", "Market", e);
            gateway_error("Failed to load trades. Please try again.")
        }
    }
}

/// 거래 제안 클릭 처리
///
/// 세션이 없으면 원격 호출 없이 차단된다. 실제 협상 채널은 열지 않는다.
pub async fn handle_trade_interest(
    State((store, _)): State<AppState>,
    Path(trade_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user = match session::require_user(store.as_ref(), &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    info!(
        "{:<12} --> 거래 제안: trade={}, user={}",
        "Market", trade_id, user.id
    );

    match store.trade_by_id(&trade_id).await {
        Ok(Some(trade)) => {
            let seller = trade
                .profiles
                .as_ref()
                .map(|p| p.username.as_str())
                .unwrap_or("Unknown");
            Json(serde_json::json!({
                "message": format!("Interested in {}? Contact {} to negotiate.", trade.title, seller),
                "code": "TRADE_INTEREST"
            }))
            .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "Trade not found.",
                "code": "TRADE_NOT_FOUND"
            })),
        )
            .into_response(),
        Err(e) => {
            error!("{:<12} --> 판매글 조회 실패: {}", "Market", e);
            gateway_error("Failed to load trade. Please try again.")
        }
    }
}

// endregion: --- Marketplace Handlers

// region:    --- Authoring Handler

/// 판매글 등록 처리 (멀티파트 폼)
///
/// 2단계 제출: 이미지를 먼저 업로드하고, 성공한 경우에만 행을 삽입한다.
/// 업로드 실패는 제출 전체를 중단한다. 삽입 실패 시 업로드된 오브젝트는
/// 남는다 (보상 삭제 없음).
pub async fn handle_post_trade(
    State((store, _)): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let user = match session::require_user(store.as_ref(), &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    info!("{:<12} --> 판매글 등록: user={}", "Command", user.id);

    // 폼 필드 수집
    let mut form = TradeForm::default();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_string();
                if name == "image" {
                    let file_name = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    match field.bytes().await {
                        Ok(bytes) => {
                            form.image = Some(ImagePart {
                                file_name,
                                content_type,
                                bytes: bytes.to_vec(),
                            })
                        }
                        // 바디 상한을 넘긴 이미지도 용량 초과로 분류한다
                        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                            return bad_request("Please select an image under 5MB.", "FILE_TOO_LARGE")
                        }
                        Err(_) => return bad_request("Malformed form data.", "INVALID_FORM"),
                    }
                } else {
                    match field.text().await {
                        Ok(value) => form.set(&name, value),
                        Err(_) => return bad_request("Malformed form data.", "INVALID_FORM"),
                    }
                }
            }
            Ok(None) => break,
            Err(_) => return bad_request("Malformed form data.", "INVALID_FORM"),
        }
    }

    // 입력 경계 검증 (모두 네트워크 호출 전)
    if form.title.trim().is_empty() {
        return bad_request("Title is required.", "MISSING_FIELD");
    }
    if form.item_type.trim().is_empty() {
        return bad_request("Item type is required.", "MISSING_FIELD");
    }
    let Some(game) = Game::parse(&form.game) else {
        return bad_request("Unknown game category.", "INVALID_GAME");
    };
    let price_robux = match form.price_robux.trim().parse::<i64>() {
        Ok(price) if price > 0 => price,
        _ => return bad_request("Price must be a positive number.", "INVALID_PRICE"),
    };
    let original_price_robux = match form.original_price_robux.trim() {
        "" => None,
        raw => match raw.parse::<i64>() {
            Ok(price) if price > 0 => Some(price),
            _ => return bad_request("Price must be a positive number.", "INVALID_PRICE"),
        },
    };
    let expires_at = match form.expires_at.trim() {
        "" => None,
        raw => match parse_expiry(raw) {
            Some(ts) => Some(ts),
            None => return bad_request("Invalid expiry date.", "INVALID_EXPIRY"),
        },
    };
    if let Some(image) = &form.image {
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return bad_request("Please select an image under 5MB.", "FILE_TOO_LARGE");
        }
    }

    // 1단계: 이미지 업로드 (선택된 경우에만)
    let mut image_url = None;
    if let Some(image) = form.image.take() {
        let ext = image
            .file_name
            .rsplit('.')
            .next()
            .filter(|ext| !ext.is_empty())
            .unwrap_or("bin");
        // 사용자 + 제출 시각 네임스페이스 키: 충돌과 교차 덮어쓰기를 막는다
        let key = format!("{}/{}.{}", user.id, Utc::now().timestamp_millis(), ext);
        match store
            .upload_image(&key, &image.content_type, image.bytes)
            .await
        {
            Ok(url) => image_url = Some(url),
            Err(e) => {
                error!("{:<12} --> 이미지 업로드 실패: {}", "Command", e);
                return (
                    StatusCode::BAD_GATEWAY,
                    Json(serde_json::json!({
                        "error": "Failed to upload image. Please try again.",
                        "code": "UPLOAD_FAILED"
                    })),
                )
                    .into_response();
            }
        }
    }

    // 2단계: 행 삽입
    let row = NewTrade {
        seller_id: user.id,
        title: form.title,
        description: form.description,
        game: game.as_str().to_string(),
        item_type: form.item_type,
        price_robux,
        original_price_robux,
        item_icon: if form.item_icon.is_empty() {
            "🎮".to_string()
        } else {
            form.item_icon
        },
        image_url,
        expires_at,
    };
    match store.insert_trade(&row).await {
        Ok(trade) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "Your trade has been listed successfully.",
                "trade": view::render_card(&trade, Utc::now())
            })),
        )
            .into_response(),
        Err(e) => {
            // 업로드된 오브젝트는 고아로 남는다 (재시도/롤백 없음)
            error!("{:<12} --> 판매글 삽입 실패: {}", "Command", e);
            gateway_error("Failed to post trade. Please try again.")
        }
    }
}

#[derive(Debug, Default)]
struct TradeForm {
    title: String,
    description: String,
    game: String,
    item_type: String,
    price_robux: String,
    original_price_robux: String,
    item_icon: String,
    expires_at: String,
    image: Option<ImagePart>,
}

#[derive(Debug)]
struct ImagePart {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl TradeForm {
    fn set(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = value,
            "description" => self.description = value,
            "game" => self.game = value,
            "item_type" => self.item_type = value,
            "price_robux" => self.price_robux = value,
            "original_price_robux" => self.original_price_robux = value,
            "item_icon" => self.item_icon = value,
            "expires_at" => self.expires_at = value,
            _ => {}
        }
    }
}

/// 만료 시각 파싱 (RFC 3339 또는 datetime-local 형식, UTC로 변환)
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

// endregion: --- Authoring Handler

// region:    --- Dashboard Handlers

/// 본인 판매글 목록 조회
pub async fn handle_my_trades(
    State((store, _)): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user = match session::require_user(store.as_ref(), &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    info!("{:<12} --> 본인 판매글 조회: user={}", "Dashboard", user.id);

    match store.search_trades(&query::owner_query(&user.id)).await {
        Ok(trades) => {
            let now = Utc::now();
            let cards: Vec<TradeCard> = trades.iter().map(|t| view::render_card(t, now)).collect();
            Json(serde_json::json!({ "count": cards.len(), "trades": cards })).into_response()
        }
        Err(e) => {
            error!("{:<12} --> 본인 판매글 조회 실패: {}", "Dashboard", e);
            gateway_error("Failed to load trades. Please try again.")
        }
    }
}

/// 본인 판매글 삭제
pub async fn handle_delete_trade(
    State((store, _)): State<AppState>,
    Path(trade_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user = match session::require_user(store.as_ref(), &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    info!(
        "{:<12} --> 판매글 삭제: trade={}, user={}",
        "Dashboard", trade_id, user.id
    );

    // 범위 술어 포함 삭제 (실제 권한 집행은 게이트웨이 정책)
    match store.delete_trade(&trade_id, &user.id).await {
        Ok(()) => Json(serde_json::json!({
            "message": "Your trade has been removed.",
            "code": "TRADE_DELETED"
        }))
        .into_response(),
        Err(e) => {
            error!("{:<12} --> 판매글 삭제 실패: {}", "Dashboard", e);
            gateway_error("Failed to delete trade. Please try again.")
        }
    }
}

/// 본인 프로필 조회
pub async fn handle_my_profile(
    State((store, _)): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user = match session::require_user(store.as_ref(), &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    info!("{:<12} --> 프로필 조회: user={}", "Dashboard", user.id);

    match store.profile_of(&user.id).await {
        Ok(profile) => Json(profile).into_response(),
        Err(crate::gateway::GatewayError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "Profile not found.",
                "code": "PROFILE_NOT_FOUND"
            })),
        )
            .into_response(),
        Err(e) => {
            error!("{:<12} --> 프로필 조회 실패: {}", "Dashboard", e);
            gateway_error("Failed to load profile. Please try again.")
        }
    }
}

// endregion: --- Dashboard Handlers

// region:    --- Session Handlers

/// 세션 조회 (없음도 정상 응답이다; 내비게이션 링크 노출 판단용)
pub async fn handle_session(
    State((store, _)): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    match session::current_user(store.as_ref(), &headers).await {
        Ok(Some(user)) => Json(serde_json::json!({
            "authenticated": true,
            "user": user
        }))
        .into_response(),
        Ok(None) => Json(serde_json::json!({ "authenticated": false })).into_response(),
        Err(e) => {
            error!("{:<12} --> 세션 조회 실패: {}", "Session", e);
            gateway_error("Failed to verify session. Please try again.")
        }
    }
}

/// 로그아웃 처리 (신원 공급자 통과 호출)
pub async fn handle_logout(
    State((store, _)): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(token) = session::bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Please login to continue.",
                "code": "LOGIN_REQUIRED"
            })),
        )
            .into_response();
    };
    match store.sign_out(token).await {
        Ok(()) => Json(serde_json::json!({ "message": "Signed out." })).into_response(),
        Err(e) => {
            error!("{:<12} --> 로그아웃 실패: {}", "Session", e);
            gateway_error("Failed to sign out. Please try again.")
        }
    }
}

// endregion: --- Session Handlers

// region:    --- Response Helpers

fn bad_request(message: &str, code: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message, "code": code })),
    )
        .into_response()
}

fn gateway_error(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({ "error": message, "code": "GATEWAY_ERROR" })),
    )
        .into_response()
}

// endregion: --- Response Helpers

// region:    --- Tests


// endregion: --- Tests
