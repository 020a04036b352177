//! Segmentation client against an in-process mock provider

mod common;

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use common::{png_bytes, signature_cutout};
use sigstamp::{
    generate_signature_stamp, BackgroundRemover, RembgClient, SegmentationConfig, StampConfig,
    StampError,
};
use std::net::SocketAddr;
use std::sync::Arc;

const API_KEY: &str = "test-key";

struct MockProvider {
    cutout_png: Vec<u8>,
}

async fn remove_background(
    State(provider): State<Arc<MockProvider>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }

    let mut image = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image") {
            image = field.bytes().await.ok();
        }
    }
    match image {
        Some(bytes) if !bytes.is_empty() => provider.cutout_png.clone().into_response(),
        _ => (StatusCode::BAD_REQUEST, "missing image").into_response(),
    }
}

async fn spawn_provider() -> SocketAddr {
    let provider = Arc::new(MockProvider {
        cutout_png: png_bytes(&signature_cutout()),
    });
    let app = Router::new()
        .route("/rmbg", post(remove_background))
        .with_state(provider);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn config_for(addr: SocketAddr, api_key: &str) -> StampConfig {
    StampConfig::builder()
        .endpoint(format!("http://{}/rmbg", addr))
        .api_key(api_key)
        .timeout_secs(Some(10))
        .font_path(None::<&str>)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_client_decodes_cutout() {
    let addr = spawn_provider().await;
    let client = RembgClient::new(config_for(addr, API_KEY).segmentation).unwrap();

    let cutout = client.remove_background(b"photo bytes").await.unwrap();
    assert_eq!(cutout.dimensions(), (200, 100));
    assert_eq!(cutout.get_pixel(60, 45)[3], 255);
    assert_eq!(cutout.get_pixel(0, 0)[3], 0);
}

#[tokio::test]
async fn test_client_reports_provider_rejection() {
    let addr = spawn_provider().await;
    let client = RembgClient::new(config_for(addr, "wrong-key").segmentation).unwrap();

    let err = client.remove_background(b"photo bytes").await.unwrap_err();
    match err {
        StampError::SegmentationFailed { status, detail } => {
            assert_eq!(status, Some(401));
            assert!(detail.contains("invalid api key"), "{}", detail);
        },
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_reports_undecodable_payload() {
    let app = Router::new().route("/rmbg", post(|| async { "not an image" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = RembgClient::new(config_for(addr, API_KEY).segmentation).unwrap();
    let err = client.remove_background(b"photo bytes").await.unwrap_err();
    assert!(matches!(err, StampError::Image(_)));
}

#[tokio::test]
async fn test_unreachable_provider() {
    let config = SegmentationConfig {
        endpoint: "http://127.0.0.1:9/rmbg".to_string(),
        api_key: API_KEY.to_string(),
        timeout_secs: Some(5),
    };
    let client = RembgClient::new(config).unwrap();
    let err = client.remove_background(b"photo").await.unwrap_err();
    assert!(matches!(
        err,
        StampError::SegmentationFailed { status: None, .. }
    ));
}

#[tokio::test]
async fn test_one_call_entry_point() {
    let addr = spawn_provider().await;
    let config = config_for(addr, API_KEY);

    let stamp = generate_signature_stamp(b"photo", "Dr. Ana Lima", "12345-SP", None, &config)
        .await
        .unwrap();
    assert_eq!(stamp.dimensions(), (480, 120));

    let err = generate_signature_stamp(b"photo", "", "12345-SP", None, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, StampError::InvalidInput(_)));
}
