// region:    --- Imports
use crate::market::model::{NewTrade, SellerProfile, Trade};
use crate::market::query::QueryPlan;
use crate::session::SessionUser;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::info;

// endregion: --- Imports

// region:    --- Gateway Error

/// 게이트웨이 호출 오류
#[derive(Debug)]
pub enum GatewayError {
    /// 전송 계층 오류 (네트워크, 역직렬화 포함)
    Transport(reqwest::Error),
    /// 게이트웨이가 거부한 요청
    Status(StatusCode, String),
    /// 단일 행 조회에 행이 없음
    NotFound(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::Transport(e) => write!(f, "gateway transport error: {}", e),
            GatewayError::Status(code, body) => {
                write!(f, "gateway rejected request ({}): {}", code, body)
            }
            GatewayError::NotFound(what) => write!(f, "not found: {}", what),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Transport(e)
    }
}

// endregion: --- Gateway Error

// region:    --- Trade Store Trait

/// 원격 데이터 게이트웨이 (테이블 저장소 + 인증 + 오브젝트 저장소)
///
/// 모든 영속성은 게이트웨이 소유다. 이 크레이트는 읽기/쓰기 요청을
/// 통과시킬 뿐 로컬 캐시나 트랜잭션을 두지 않는다.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// 판매글 검색 (쿼리 플랜 실행)
    async fn search_trades(&self, plan: &QueryPlan) -> Result<Vec<Trade>, GatewayError>;

    /// 단일 판매글 조회
    async fn trade_by_id(&self, id: &str) -> Result<Option<Trade>, GatewayError>;

    /// 판매글 삽입 (삽입된 행 반환)
    async fn insert_trade(&self, row: &NewTrade) -> Result<Trade, GatewayError>;

    /// 판매글 삭제 (id + 판매자 범위)
    async fn delete_trade(&self, id: &str, seller_id: &str) -> Result<(), GatewayError>;

    /// 판매자 프로필 조회
    async fn profile_of(&self, user_id: &str) -> Result<SellerProfile, GatewayError>;

    /// 이미지 업로드. 성공 시 공개 URL 반환.
    async fn upload_image(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, GatewayError>;

    /// 베어러 토큰의 세션 사용자 조회 (유효하지 않은 토큰은 None)
    async fn current_user(&self, token: &str) -> Result<Option<SessionUser>, GatewayError>;

    /// 로그아웃 통과 호출
    async fn sign_out(&self, token: &str) -> Result<(), GatewayError>;
}

// endregion: --- Trade Store Trait

// region:    --- Gateway Client

/// 이미지 업로드 버킷
pub const IMAGE_BUCKET: &str = "trade-images";

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl GatewayClient {
    /// 환경 변수로 게이트웨이 클라이언트 생성
    pub fn new() -> Self {
        let base_url = std::env::var("GATEWAY_URL").expect("GATEWAY_URL must be set");
        let anon_key = std::env::var("GATEWAY_ANON_KEY").expect("GATEWAY_ANON_KEY must be set");
        Self::with_config(base_url, anon_key)
    }

    pub fn with_config(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        GatewayClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// 업로드된 오브젝트의 공개 URL (업로드 성공 후에만 사용)
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, IMAGE_BUCKET, key
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    async fn expect_success(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(GatewayError::Status(status, body))
        }
    }
}

#[async_trait]
impl TradeStore for GatewayClient {
    async fn search_trades(&self, plan: &QueryPlan) -> Result<Vec<Trade>, GatewayError> {
        info!("{:<12} --> 판매글 검색: {:?}", "Gateway", plan.params);
        let resp = self
            .authed(self.http.get(self.rest_url("trades")).query(&plan.params))
            .send()
            .await?;
        let rows = Self::expect_success(resp).await?.json::<Vec<Trade>>().await?;
        Ok(rows)
    }

    async fn trade_by_id(&self, id: &str) -> Result<Option<Trade>, GatewayError> {
        info!("{:<12} --> 판매글 조회 id: {}", "Gateway", id);
        let plan = crate::market::query::trade_by_id_query(id);
        let rows = self.search_trades(&plan).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_trade(&self, row: &NewTrade) -> Result<Trade, GatewayError> {
        info!("{:<12} --> 판매글 삽입: {}", "Gateway", row.title);
        let resp = self
            .authed(self.http.post(self.rest_url("trades")))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let mut rows = Self::expect_success(resp).await?.json::<Vec<Trade>>().await?;
        rows.pop()
            .ok_or_else(|| GatewayError::NotFound("inserted trade row".to_string()))
    }

    async fn delete_trade(&self, id: &str, seller_id: &str) -> Result<(), GatewayError> {
        info!("{:<12} --> 판매글 삭제 id: {}", "Gateway", id);
        let resp = self
            .authed(self.http.delete(self.rest_url("trades")).query(&[
                ("id", format!("eq.{}", id)),
                ("seller_id", format!("eq.{}", seller_id)),
            ]))
            .send()
            .await?;
        Self::expect_success(resp).await?;
        Ok(())
    }

    async fn profile_of(&self, user_id: &str) -> Result<SellerProfile, GatewayError> {
        info!("{:<12} --> 프로필 조회 user: {}", "Gateway", user_id);
        let resp = self
            .authed(self.http.get(self.rest_url("profiles")).query(&[
                (
                    "select",
                    "username,display_name,verified,rating,total_trades".to_string(),
                ),
                ("user_id", format!("eq.{}", user_id)),
            ]))
            .send()
            .await?;
        let mut rows = Self::expect_success(resp)
            .await?
            .json::<Vec<SellerProfile>>()
            .await?;
        rows.pop()
            .ok_or_else(|| GatewayError::NotFound(format!("profile for {}", user_id)))
    }

    async fn upload_image(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, GatewayError> {
        info!(
            "{:<12} --> 이미지 업로드 key: {}, {} bytes",
            "Gateway",
            key,
            bytes.len()
        );
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, IMAGE_BUCKET, key);
        let resp = self
            .authed(self.http.post(url))
            .header("Content-Type", content_type.to_string())
            .body(bytes)
            .send()
            .await?;
        Self::expect_success(resp).await?;
        Ok(self.public_url(key))
    }

    async fn current_user(&self, token: &str) -> Result<Option<SessionUser>, GatewayError> {
        let resp = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;
        match resp.status() {
            status if status.is_success() => Ok(Some(resp.json::<SessionUser>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(GatewayError::Status(status, body))
            }
        }
    }

    async fn sign_out(&self, token: &str) -> Result<(), GatewayError> {
        info!("{:<12} --> 로그아웃", "Gateway");
        let resp = self
            .http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;
        Self::expect_success(resp).await?;
        Ok(())
    }
}

// endregion: --- Gateway Client
