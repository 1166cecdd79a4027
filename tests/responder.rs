//! End-to-end behavior of the responder over real sockets.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use mock_responder::config::ResponderConfig;
use mock_responder::http::HttpServer;
use reqwest::Method;

mod common;

#[tokio::test]
async fn default_answers_ok_for_any_path() {
    let server = common::start_server(ResponderConfig::default()).await;
    let client = common::client();

    for path in ["/", "/anything", "/a/b/c?x=1"] {
        let response = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.text().await.unwrap(), "OK");
    }

    server.stop().await;
}

#[tokio::test]
async fn configured_status_and_reason_phrase() {
    let config = ResponderConfig {
        status: StatusCode::NOT_FOUND,
        ..ResponderConfig::default()
    };
    let server = common::start_server(config).await;

    let response = common::client()
        .post(server.url("/missing"))
        .body("ignored")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "Not Found");

    server.stop().await;
}

#[tokio::test]
async fn unregistered_status_has_empty_body() {
    let config = ResponderConfig {
        status: StatusCode::from_u16(599).unwrap(),
        ..ResponderConfig::default()
    };
    let server = common::start_server(config).await;

    let response = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 599);
    assert_eq!(response.text().await.unwrap(), "");

    server.stop().await;
}

#[tokio::test]
async fn no_content_sends_no_body() {
    let config = ResponderConfig {
        status: StatusCode::NO_CONTENT,
        ..ResponderConfig::default()
    };
    let server = common::start_server(config).await;

    let response = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.text().await.unwrap(), "");

    server.stop().await;
}

#[tokio::test]
async fn auth_subject_required() {
    let config = ResponderConfig {
        check_auth_subject: true,
        ..ResponderConfig::default()
    };
    let server = common::start_server(config).await;
    let client = common::client();

    let rejected = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(rejected.status(), StatusCode::FORBIDDEN);
    assert_eq!(rejected.text().await.unwrap(), "Forbidden");

    let accepted = client
        .get(server.url("/"))
        .header("X-Auth-Subject", "user-1")
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);

    let empty = client
        .get(server.url("/"))
        .header("X-Auth-Subject", "")
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::OK);

    server.stop().await;
}

#[tokio::test]
async fn method_restriction() {
    let config = ResponderConfig {
        check_request_method: true,
        allowed_methods: vec!["GET".to_string(), "POST".to_string()],
        ..ResponderConfig::default()
    };
    let server = common::start_server(config).await;
    let client = common::client();

    let allowed = client.post(server.url("/")).send().await.unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);

    let denied = client.delete(server.url("/")).send().await.unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let extension = client
        .request(Method::from_bytes(b"BREW").unwrap(), server.url("/"))
        .send()
        .await
        .unwrap();
    assert_eq!(extension.status(), StatusCode::FORBIDDEN);

    server.stop().await;
}

#[tokio::test]
async fn auth_headers_are_copied() {
    let config = ResponderConfig {
        copy_auth_header: true,
        status: StatusCode::ACCEPTED,
        ..ResponderConfig::default()
    };
    let server = common::start_server(config).await;

    let response = common::client()
        .get(server.url("/"))
        .header("Authorization", "Bearer abc")
        .header("X-Auth-Role", "admin")
        .header("X-Auth-Tenant", "t-9")
        .header("X-Trace", "not-copied")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let headers = response.headers();
    assert_eq!(headers["authorization"], "Bearer abc");
    assert_eq!(headers["x-auth-role"], "admin");
    assert_eq!(headers["x-auth-tenant"], "t-9");
    assert!(headers.get("x-trace").is_none());
    assert_eq!(response.text().await.unwrap(), "Accepted");

    server.stop().await;
}

#[tokio::test]
async fn rejection_suppresses_copied_headers() {
    let config = ResponderConfig {
        copy_auth_header: true,
        check_auth_subject: true,
        ..ResponderConfig::default()
    };
    let server = common::start_server(config).await;

    let response = common::client()
        .get(server.url("/"))
        .header("Authorization", "Bearer abc")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get("authorization").is_none());

    server.stop().await;
}

#[tokio::test]
async fn diagnostics_do_not_change_responses() {
    let config = ResponderConfig {
        debug: true,
        access_log: true,
        ..ResponderConfig::default()
    };
    let server = common::start_server(config).await;

    let response = common::client()
        .put(server.url("/upload"))
        .body(vec![b'x'; 64 * 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");

    server.stop().await;
}

#[tokio::test]
async fn head_request_gets_status_only() {
    let server = common::start_server(ResponderConfig::default()).await;

    let response = common::client().head(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "");

    server.stop().await;
}

#[tokio::test]
async fn peer_address_reaches_the_router() {
    let server = HttpServer::new(ResponderConfig::default()).map_router(|router| {
        router.layer(axum::middleware::from_fn(|request: Request, next: Next| async move {
            let peer = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string());
            let mut response = next.run(request).await;
            if let Some(peer) = peer {
                response
                    .headers_mut()
                    .insert("x-peer-ip", HeaderValue::from_str(&peer).unwrap());
            }
            response
        }))
    });
    let server = common::start_with(server).await;

    let response = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(response.headers()["x-peer-ip"], "127.0.0.1");

    server.stop().await;
}
