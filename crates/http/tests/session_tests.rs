//! Integration tests for the response interceptor and session controller

use dashboard_core::{CredentialPair, ListQuery, MemoryTokenStore, TokenKey, TokenStore};
use dashboard_http::{
    ApiClient, ClientError, LoginRequest, RegisterRequest, SessionEvent, SessionStatus,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "role": "admin",
        "isEmailVerified": true
    })
}

fn tokens_json(access: &str, refresh: &str) -> Value {
    json!({
        "access": { "token": access, "expires": "2026-10-19T12:00:00.000Z" },
        "refresh": { "token": refresh, "expires": "2026-11-18T12:00:00.000Z" }
    })
}

fn empty_page() -> Value {
    json!({ "results": [], "page": 1, "limit": 5, "totalPages": 0, "totalResults": 0 })
}

fn client_with(server: &MockServer, store: &Arc<MemoryTokenStore>) -> ApiClient {
    ApiClient::builder()
        .base_url(server.uri())
        .token_store(store.clone())
        .build()
        .unwrap()
}

fn signed_in_store(access: &str, refresh: &str) -> Arc<MemoryTokenStore> {
    Arc::new(MemoryTokenStore::with_pair(&CredentialPair::new(
        access, refresh,
    )))
}

fn stored_pair(store: &MemoryTokenStore) -> Option<CredentialPair> {
    CredentialPair::load(store).unwrap()
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, &signed_in_store("a1", "r1"));
    let page = client.list_products(&ListQuery::default()).await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_401_with_refresh_token_reissues_once_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "tokens": tokens_json("a2", "r2") })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": "p1", "name": "Lamp", "price": 12.5, "color": "red", "type": "home" }],
            "page": 1, "limit": 5, "totalPages": 1, "totalResults": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = signed_in_store("stale", "r1");
    let client = client_with(&server, &store);
    let mut events = client.session().subscribe();

    let page = client.list_products(&ListQuery::default()).await.unwrap();

    assert_eq!(page.total_results, 1);
    assert_eq!(page.results[0].name, "Lamp");
    assert_eq!(stored_pair(&store), Some(CredentialPair::new("a2", "r2")));
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
}

#[tokio::test]
async fn test_401_without_refresh_token_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // Access token without its refresh token counts as signed out
    let store = Arc::new(MemoryTokenStore::new());
    store.set(TokenKey::Access, "a1").unwrap();
    let client = client_with(&server, &store);
    let mut events = client.session().subscribe();

    let result = client.list_users(&ListQuery::default()).await;

    assert!(matches!(result, Err(ClientError::SessionExpired)));
    assert_eq!(store.get(TokenKey::Access).unwrap(), None);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoginRequired);
    assert_eq!(
        SessionEvent::LoginRequired.redirect_to(),
        Some("/auth/login")
    );
}

#[tokio::test]
async fn test_retried_request_is_not_retried_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/u1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 401,
            "message": "Please authenticate"
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "tokens": tokens_json("a2", "r2") })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = signed_in_store("a1", "r1");
    let client = client_with(&server, &store);

    let result = client.get_user("u1").await;

    assert!(
        matches!(result, Err(ClientError::AuthenticationFailed(ref m)) if m == "Please authenticate")
    );
    // The reissued pair is kept; only the request failed
    assert_eq!(stored_pair(&store), Some(CredentialPair::new("a2", "r2")));
}

#[tokio::test]
async fn test_failed_reissue_clears_session_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/products/p1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "message": "Invalid refresh token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = signed_in_store("a1", "r1");
    let client = client_with(&server, &store);
    let mut events = client.session().subscribe();

    let result = client.delete_product("p1").await;

    assert!(matches!(result, Err(ClientError::SessionExpired)));
    assert!(result.unwrap_err().is_auth_expired());
    assert_eq!(stored_pair(&store), None);
    assert_eq!(store.get(TokenKey::Refresh).unwrap(), None);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoginRequired);
}

#[tokio::test]
async fn test_concurrent_401s_share_one_reissue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "tokens": tokens_json("a2", "r2") }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_with(&server, &signed_in_store("stale", "r1"));
    let query = ListQuery::default();

    let (first, second) = tokio::join!(client.list_products(&query), client.list_products(&query));

    assert!(first.is_ok());
    assert!(second.is_ok());
}

#[tokio::test]
async fn test_concurrent_401s_after_failed_reissue_fail_together() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, &signed_in_store("stale", "r1"));
    let query = ListQuery::default();

    let (first, second) = tokio::join!(client.list_products(&query), client.list_products(&query));

    assert!(matches!(first, Err(ClientError::SessionExpired)));
    assert!(matches!(second, Err(ClientError::SessionExpired)));
}

#[tokio::test]
async fn test_non_401_errors_pass_through_typed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/products/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "Product not found"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/products/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with(&server, &signed_in_store("a1", "r1"));

    let missing = client.get_product("missing").await.unwrap_err();
    assert!(matches!(missing, ClientError::NotFound(ref m) if m == "Product not found"));

    let broken = client.get_product("broken").await.unwrap_err();
    assert!(broken.is_server_error());
    assert_eq!(broken.user_message(), "Server error");
}

#[tokio::test]
async fn test_timeout_is_a_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/products/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = ApiClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = client.get_product("slow").await.unwrap_err();
    assert!(err.is_timeout());
    assert!(err.is_server_error());
}

#[tokio::test]
async fn test_zero_timeout_disables_the_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(empty_page())
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::builder()
        .base_url(server.uri())
        .timeout(Duration::ZERO)
        .build()
        .unwrap();

    let page = client.list_products(&ListQuery::default()).await.unwrap();
    assert_eq!(page.total_results, 0);
}

#[tokio::test]
async fn test_orphaned_access_token_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store.set(TokenKey::Access, "orphan").unwrap();
    let client = client_with(&server, &store);

    assert!(!client.session().is_authenticated());
    assert_eq!(client.session().access_token().unwrap(), None);
    client.list_products(&ListQuery::default()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_login_stores_session_and_redirects_to_return_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "password1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json("u1"),
            "tokens": tokens_json("a1", "r1")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = client_with(&server, &store);
    let mut events = client.session().subscribe();

    let signed_in = client
        .session()
        .login(
            &LoginRequest::new("ada@example.com", "password1"),
            Some("/products"),
        )
        .await
        .unwrap();

    assert_eq!(signed_in.redirect_to, "/products");
    assert_eq!(signed_in.user.id, "u1");
    assert_eq!(client.session().user().map(|u| u.id), Some("u1".to_string()));
    assert!(client.session().is_authenticated());
    assert_eq!(stored_pair(&store), Some(CredentialPair::new("a1", "r1")));
    assert!(matches!(
        events.try_recv().unwrap(),
        SessionEvent::SignedIn { ref redirect_to, .. } if redirect_to == "/products"
    ));
}

#[tokio::test]
async fn test_login_without_return_url_lands_on_dashboards() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json("u1"),
            "tokens": tokens_json("a1", "r1")
        })))
        .mount(&server)
        .await;

    let client = client_with(&server, &Arc::new(MemoryTokenStore::new()));
    let credentials = LoginRequest::new("ada@example.com", "password1");

    let root = client.session().login(&credentials, Some("/")).await.unwrap();
    assert_eq!(root.redirect_to, "/dashboards");

    let none = client.session().login(&credentials, None).await.unwrap();
    assert_eq!(none.redirect_to, "/dashboards");
}

#[tokio::test]
async fn test_rejected_login_leaves_existing_session_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 401,
            "message": "Incorrect email or password"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = signed_in_store("a1", "r1");
    let client = client_with(&server, &store);
    let mut events = client.session().subscribe();

    let err = client
        .session()
        .login(&LoginRequest::new("ada@example.com", "wrong"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::InvalidCredentials(ref m) if m == "Incorrect email or password"));
    assert_eq!(err.user_message(), "Incorrect email or password");
    assert_eq!(stored_pair(&store), Some(CredentialPair::new("a1", "r1")));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_malformed_login_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with(&server, &Arc::new(MemoryTokenStore::new()));
    let err = client
        .session()
        .login(&LoginRequest::new("not-an-email", "pw"), None)
        .await
        .unwrap_err();

    assert!(err.is_validation());
}

#[tokio::test]
async fn test_register_signs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/register"))
        .and(body_json(json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "password": "password1"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "user": user_json("u9"),
            "tokens": tokens_json("a9", "r9")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = client_with(&server, &store);

    let details = RegisterRequest {
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        password: "password1".into(),
    };
    let signed_in = client.session().register(&details, None).await.unwrap();

    assert_eq!(signed_in.user.id, "u9");
    assert_eq!(signed_in.redirect_to, "/dashboards");
    assert_eq!(stored_pair(&store), Some(CredentialPair::new("a9", "r9")));
}

#[tokio::test]
async fn test_register_conflict_is_a_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "message": "Email already taken"
        })))
        .mount(&server)
        .await;

    let client = client_with(&server, &Arc::new(MemoryTokenStore::new()));
    let details = RegisterRequest {
        name: "Ada".into(),
        email: "ada@example.com".into(),
        password: "password1".into(),
    };

    let err = client.session().register(&details, None).await.unwrap_err();
    assert!(matches!(err, ClientError::BadRequest(ref m) if m == "Email already taken"));
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/logout"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = signed_in_store("a1", "r1");
    let client = client_with(&server, &store);

    client.session().logout().await.unwrap();

    assert_eq!(stored_pair(&store), None);
}

#[tokio::test]
async fn test_logout_clears_session_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json("u1"),
            "tokens": tokens_json("a1", "r1")
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = client_with(&server, &store);
    client
        .session()
        .login(&LoginRequest::new("ada@example.com", "password1"), None)
        .await
        .unwrap();
    let mut events = client.session().subscribe();

    client.session().logout().await.unwrap();

    assert_eq!(stored_pair(&store), None);
    assert_eq!(client.session().user(), None);
    assert!(!client.session().is_authenticated());
    let event = events.try_recv().unwrap();
    assert_eq!(event, SessionEvent::SignedOut);
    assert_eq!(event.redirect_to(), Some("/auth/login"));
}

#[tokio::test]
async fn test_logout_with_unreachable_server_still_signs_out() {
    let store = signed_in_store("a1", "r1");
    // Nothing listens on the discard port
    let client = ApiClient::builder()
        .base_url("http://127.0.0.1:9")
        .timeout(Duration::from_millis(500))
        .token_store(store.clone())
        .build()
        .unwrap();

    client.session().logout().await.unwrap();

    assert_eq!(stored_pair(&store), None);
}

#[tokio::test]
async fn test_restore_session_reissues_stored_pair() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json("u1"),
            "tokens": tokens_json("a2", "r2")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = signed_in_store("a1", "r1");
    let client = client_with(&server, &store);

    let status = client.session().restore_session().await.unwrap();

    assert!(matches!(
        status,
        SessionStatus::Authenticated { user: Some(ref user) } if user.id == "u1"
    ));
    assert_eq!(stored_pair(&store), Some(CredentialPair::new("a2", "r2")));
}

#[tokio::test]
async fn test_restore_session_without_tokens_requires_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with(&server, &Arc::new(MemoryTokenStore::new()));
    let mut events = client.session().subscribe();

    let status = client.session().restore_session().await.unwrap();

    assert_eq!(status, SessionStatus::LoginRequired);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoginRequired);
}

#[tokio::test]
async fn test_restore_session_failure_clears_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-tokens"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let store = signed_in_store("a1", "r1");
    let client = client_with(&server, &store);

    let status = client.session().restore_session().await.unwrap();

    assert_eq!(status, SessionStatus::LoginRequired);
    assert_eq!(stored_pair(&store), None);
}
