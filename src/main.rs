// region:    --- Imports
use crate::gateway::GatewayClient;
use crate::market::feed::MarketFeed;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod gateway;
mod handlers;
mod market;
mod session;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 게이트웨이 클라이언트 생성 (GATEWAY_URL / GATEWAY_ANON_KEY)
    let store: Arc<dyn gateway::TradeStore> = Arc::new(GatewayClient::new());
    info!("{:<12} --> 게이트웨이 클라이언트 초기화 성공", "Main");

    // 마켓플레이스 피드 생성 (늦게 도착한 응답 폐기)
    let feed = Arc::new(MarketFeed::new());

    // 브라우저 스토어프런트를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정 (바디 상한 = 이미지 5MiB + 멀티파트 여유분)
    let routes_all = handlers::router((store, feed))
        .layer(cors)
        .layer(DefaultBodyLimit::max(handlers::MAX_IMAGE_BYTES + 1024 * 1024));

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
