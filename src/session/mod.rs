// region:    --- Imports
use crate::gateway::{GatewayError, TradeStore};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Session Model

/// 세션 사용자 (게이트웨이 인증 엔드포인트가 확인한 신원)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

// endregion: --- Session Model

// region:    --- Session Gate

/// Authorization 헤더의 베어러 토큰
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// 세션 게이트
///
/// 모든 변경 동작 앞에 적용되는 술어. 토큰이 없으면 원격 호출 없이
/// 즉시 차단하고, 토큰이 있으면 게이트웨이 인증 엔드포인트로 확인한다.
pub async fn require_user(
    store: &dyn TradeStore,
    headers: &HeaderMap,
) -> Result<SessionUser, Response> {
    let Some(token) = bearer_token(headers) else {
        info!("{:<12} --> 세션 없음: 동작 차단", "Session");
        return Err(login_required());
    };
    match store.current_user(token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            info!("{:<12} --> 유효하지 않은 토큰: 동작 차단", "Session");
            Err(login_required())
        }
        Err(e) => Err(gateway_unavailable(e)),
    }
}

/// 세션 조회 (없음도 정상 상태)
pub async fn current_user(
    store: &dyn TradeStore,
    headers: &HeaderMap,
) -> Result<Option<SessionUser>, GatewayError> {
    match bearer_token(headers) {
        None => Ok(None),
        Some(token) => store.current_user(token).await,
    }
}

fn login_required() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Please login to continue.",
            "code": "LOGIN_REQUIRED"
        })),
    )
        .into_response()
}

fn gateway_unavailable(e: GatewayError) -> Response {
    tracing::error!("{:<12} --> 세션 확인 실패: {}", "Session", e);
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({
            "error": "Failed to verify session. Please try again.",
            "code": "GATEWAY_ERROR"
        })),
    )
        .into_response()
}

// endregion: --- Session Gate

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    /// 베어러 토큰 추출 테스트
    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc123"));
        assert_eq!(bearer_token(&headers), None);
    }
}

// endregion: --- Tests
