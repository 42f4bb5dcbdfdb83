//! HTTP surface: a static landing page and the filtered feed endpoint.

use crate::error::FeedError;
use crate::feed::render;
use crate::service::{FeedResponse, FeedService};
use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const MAX_CHANNEL_ID_LEN: usize = 64;

/// The only feed document this service knows how to produce.
pub const FEED_OUTPUT: &str = "videos.xml";

const INDEX_HTML: &str = include_str!("../static/index.html");

const MARKER_HEADER: &str = "x-meow";
const MARKER_VALUE: &str = "mrrp";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FeedService>,
    pub request_timeout: Duration,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/feeds/:output", get(feed))
        .layer(middleware::map_response(mark_response))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Serves until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn feed(
    State(state): State<AppState>,
    Path(output): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    if output != FEED_OUTPUT {
        return (StatusCode::NOT_FOUND, "unknown feed").into_response();
    }

    // First occurrence wins when the parameter is repeated.
    let channel_id = query
        .iter()
        .find(|(key, _)| key == "channel_id")
        .map(|(_, value)| value.as_str());
    let channel_id = match channel_id {
        None | Some("") => {
            return (StatusCode::UNPROCESSABLE_ENTITY, "no channel_id").into_response();
        }
        Some(id) if id.len() > MAX_CHANNEL_ID_LEN => {
            return (StatusCode::UNPROCESSABLE_ENTITY, "weirdly long channel_id").into_response();
        }
        Some(id) => id,
    };

    // Cancelled on timeout, or when this handler is dropped because the client left.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let deadline = cancel.clone();
    let timeout = state.request_timeout;
    tokio::spawn(async move {
        tokio::select! {
            _ = deadline.cancelled() => {}
            _ = tokio::time::sleep(timeout) => deadline.cancel(),
        }
    });

    match state.service.get_feed(channel_id, &cancel).await {
        Ok(FeedResponse::Document(doc)) => {
            ([(header::CONTENT_TYPE, render::CONTENT_TYPE)], doc).into_response()
        }
        Ok(FeedResponse::NotFound) => (StatusCode::NOT_FOUND, "feed not found").into_response(),
        Err(e) => {
            if let FeedError::Cancelled(_) = e {
                warn!("request for {} abandoned: {}", channel_id, e);
            }
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

async fn mark_response(mut response: Response) -> Response {
    response.headers_mut().insert(
        HeaderName::from_static(MARKER_HEADER),
        HeaderValue::from_static(MARKER_VALUE),
    );
    response
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;
    info!(
        "\"{} {}\" {} in {:?}",
        method,
        uri,
        response.status().as_u16(),
        start.elapsed()
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, NoopCache};
    use crate::classifier::Classifier;
    use crate::feed::FeedFilter;
    use crate::service::FeedTtls;
    use crate::testing::{StubFeedSource, StubProbe};
    use axum::body::Body;
    use tower::ServiceExt;
    use url::Url;

    fn state() -> AppState {
        let cache = Arc::new(MemoryCache::new());
        let classifier = Classifier::new(
            Arc::new(NoopCache),
            Arc::new(StubProbe::new()),
            Duration::from_secs(60),
        );
        let filter = FeedFilter::new(Arc::new(StubFeedSource::new()), classifier);
        let service = FeedService::new(
            cache,
            filter,
            Url::parse("https://feeds.example.com/videos.xml").unwrap(),
            FeedTtls::default(),
        );
        AppState {
            service: Arc::new(service),
            request_timeout: Duration::from_secs(5),
        }
    }

    async fn call(uri: &str) -> (StatusCode, Option<String>, String) {
        let response = router(state())
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let marker = response
            .headers()
            .get("x-meow")
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, marker, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_served() {
        let (status, marker, body) = call("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(marker.as_deref(), Some("mrrp"));
        assert!(body.contains("/feeds/videos.xml?channel_id="));
    }

    #[tokio::test]
    async fn test_unknown_output() {
        let (status, marker, _) = call("/feeds/other.xml?channel_id=UC1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(marker.as_deref(), Some("mrrp"));
    }

    #[tokio::test]
    async fn test_empty_channel_id() {
        let (status, _, body) = call("/feeds/videos.xml?channel_id=").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "no channel_id");
    }

    #[tokio::test]
    async fn test_channel_id_at_limit_is_accepted() {
        let uri = format!("/feeds/videos.xml?channel_id={}", "a".repeat(MAX_CHANNEL_ID_LEN));
        let (status, _, body) = call(&uri).await;
        // stub upstream knows no feeds
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "feed not found");
    }

    #[tokio::test]
    async fn test_repeated_channel_id_uses_first() {
        let long = "a".repeat(MAX_CHANNEL_ID_LEN + 1);
        let uri = format!("/feeds/videos.xml?channel_id=UC1&channel_id={}", long);
        let (status, marker, body) = call(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(marker.as_deref(), Some("mrrp"));
        assert_eq!(body, "feed not found");

        let uri = format!("/feeds/videos.xml?channel_id={}&channel_id=UC1", long);
        let (status, _, body) = call(&uri).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "weirdly long channel_id");
    }
}
