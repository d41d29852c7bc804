use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

use crate::adapters::http::state::HttpState;
use crate::application::dto::{ControlResponse, ErrorResponse, IdentifiedItemsResponse};
use crate::domain::{errors::DomainError, stream::CONTENT_TYPE};

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = match &self {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DomainError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Stream `multipart/x-mixed-replace` con un JPEG anotado por parte.
pub async fn video_feed(State(st): State<HttpState>) -> Response {
    match st.stream.open().await {
        Ok(rx) => {
            let parts = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
            (
                [(header::CONTENT_TYPE, CONTENT_TYPE), (header::CACHE_CONTROL, "no-cache")],
                Body::from_stream(parts),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("No se pudo abrir el stream: {}", e);
            e.into_response()
        }
    }
}

pub async fn control_feed(State(st): State<HttpState>, Path(action): Path<String>) -> impl IntoResponse {
    st.feed.control(&action);
    Json(ControlResponse::ok())
}

pub async fn identified_items(State(st): State<HttpState>) -> impl IntoResponse {
    Json(IdentifiedItemsResponse { identified_items: st.feed.identified_items() })
}

pub async fn feed_status(State(st): State<HttpState>) -> impl IntoResponse {
    Json(st.feed.snapshot())
}

pub async fn get_config(State(st): State<HttpState>) -> impl IntoResponse {
    Json(st.config.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::to_bytes, http::Request, Router};
    use clap::Parser;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::adapters::http::{router, state::HttpState};
    use crate::application::ports::{DetectorPort, FrameSourcePort};
    use crate::application::services::{FeedService, StreamService};
    use crate::config::AppConfig;
    use crate::testing::{FixedDetector, ManualClock, PlainRenderer, ScriptedFrames, UnavailableFrames};

    use super::*;

    struct Harness {
        app: Router,
        feed: Arc<FeedService>,
        clock: Arc<ManualClock>,
    }

    fn harness_with(frames: Arc<dyn FrameSourcePort>, detector: Box<dyn DetectorPort>) -> Harness {
        let config = AppConfig::parse_from(["feed-recognizer", "--fps", "200", "--pause-poll-ms", "5"]);
        let clock = Arc::new(ManualClock::new("10:00:00"));
        let feed = FeedService::new(clock.clone());
        let stream = StreamService::new(frames, detector, Arc::new(PlainRenderer), feed.clone(), config.stream_settings());
        let feed = Arc::new(feed);
        let state = HttpState { feed: feed.clone(), stream: Arc::new(stream), config: Arc::new(config) };
        Harness { app: router(state), feed, clock }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(ScriptedFrames::new(8, 8)), Box::new(FixedDetector::labels(&["Cat"])))
    }

    async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn as_json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn control_always_reports_ok() {
        let h = harness();
        for action in ["pause", "resume", "reload", "explode"] {
            let (status, body) = send(&h.app, "POST", &format!("/control/{action}")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(as_json(&body), json!({ "status": "ok" }));
        }
    }

    #[tokio::test]
    async fn identified_items_shape_and_dedup() {
        let h = harness();
        let (_, body) = send(&h.app, "GET", "/identified-items").await;
        assert_eq!(as_json(&body), json!({ "identified_items": [] }));

        h.feed.record_frame(vec!["Cat".into(), "Dog".into()]);
        h.feed.record_frame(vec!["Cat".into()]);
        send(&h.app, "GET", "/identified-items").await;
        let (_, body) = send(&h.app, "GET", "/identified-items").await;
        assert_eq!(
            as_json(&body),
            json!({ "identified_items": [ { "time": "10:00:00", "data": { "Cat": 1, "Dog": 0 } } ] })
        );

        h.clock.set("10:00:01");
        let (_, body) = send(&h.app, "GET", "/identified-items").await;
        let items = as_json(&body)["identified_items"].as_array().unwrap().clone();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["time"], "10:00:01");
    }

    #[tokio::test]
    async fn paused_polls_are_identical() {
        let h = harness();
        h.feed.record_frame(vec!["Cat".into()]);
        send(&h.app, "GET", "/identified-items").await;
        send(&h.app, "POST", "/control/pause").await;

        h.clock.set("10:00:05");
        let (_, first) = send(&h.app, "GET", "/identified-items").await;
        h.feed.record_frame(vec!["Dog".into()]);
        h.clock.set("10:00:06");
        let (_, second) = send(&h.app, "GET", "/identified-items").await;
        assert_eq!(first, second);

        send(&h.app, "POST", "/control/resume").await;
        let (_, third) = send(&h.app, "GET", "/identified-items").await;
        assert_ne!(first, third);
    }

    #[tokio::test]
    async fn reload_clears_log_but_not_counters() {
        let h = harness();
        h.feed.record_frame(vec!["Cat".into()]);
        send(&h.app, "GET", "/identified-items").await;
        send(&h.app, "POST", "/control/reload").await;

        let (_, body) = send(&h.app, "GET", "/api/status").await;
        let status = as_json(&body);
        assert_eq!(status["status"], "running");
        assert_eq!(status["total_frames"], 1);
        assert_eq!(status["history_len"], 1);
        assert_eq!(status["current_items"], json!({ "Cat": 1 }));
        assert_eq!(h.feed.snapshot().total_frames, 1);
    }

    #[tokio::test]
    async fn config_is_exposed() {
        let h = harness();
        let (status, body) = send(&h.app, "GET", "/api/config").await;
        assert_eq!(status, StatusCode::OK);
        let cfg = as_json(&body);
        assert_eq!(cfg["fps"], 200);
        assert_eq!(cfg["fourcc"], "MJPG");
    }

    #[tokio::test]
    async fn video_feed_streams_multipart() {
        let h = harness();
        let req = Request::builder().uri("/video-feed").body(Body::empty()).unwrap();
        let res = h.app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], CONTENT_TYPE);

        let mut data = res.into_body().into_data_stream();
        let first = data.next().await.expect("part").expect("bytes");
        assert!(first.starts_with(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n"));
        assert!(h.feed.snapshot().total_frames >= 1);
    }

    #[tokio::test]
    async fn video_feed_reports_unavailable_camera() {
        let h = harness_with(Arc::new(UnavailableFrames), Box::new(FixedDetector::labels(&[])));
        let (status, body) = send(&h.app, "GET", "/video-feed").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(as_json(&body)["error"].as_str().unwrap().contains("/dev/video0"));
    }
}
