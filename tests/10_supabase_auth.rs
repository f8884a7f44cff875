mod common;

use std::sync::Arc;

use axum::http::Method;
use serde_json::json;

use common::{session_json, user_json, StubServer, ANON_KEY};
use poetry_client::gateway::SupabaseGateway;
use poetry_client::models::ProfileFields;
use poetry_client::storage::{MemoryTokenStore, TokenStore};
use poetry_client::store::Store;

const KEY: &str = "supabase_token";

async fn setup() -> anyhow::Result<(StubServer, Store, Arc<MemoryTokenStore>)> {
    let stub = StubServer::start().await?;
    let tokens = Arc::new(MemoryTokenStore::new());
    let gateway = Arc::new(SupabaseGateway::new(&stub.backend_config())?);
    let store = Store::new(gateway, tokens.clone(), KEY);
    Ok((stub, store, tokens))
}

#[tokio::test]
async fn login_then_logout_persists_and_clears_token() -> anyhow::Result<()> {
    let (stub, store, tokens) = setup().await?;
    stub.respond(Method::POST, "/auth/v1/token", 200, session_json("at-1", user_json("u-1", "li@bai.cn")));
    stub.respond(Method::POST, "/auth/v1/logout", 204, serde_json::Value::Null);

    let result = store.login("li@bai.cn", "moonlight").await;
    assert!(result.success, "{:?}", result.error);
    assert!(store.is_authenticated());
    assert_eq!(tokens.get(KEY).as_deref(), Some("at-1"));

    let sign_in = &stub.requests_to(Method::POST, "/auth/v1/token")[0];
    assert_eq!(sign_in.query_value("grant_type").as_deref(), Some("password"));
    assert_eq!(sign_in.header("apikey"), Some(ANON_KEY));
    assert_eq!(sign_in.body, json!({ "email": "li@bai.cn", "password": "moonlight" }));

    store.logout().await;
    assert!(store.current_user().is_none());
    assert!(store.session().is_none());
    assert_eq!(tokens.get(KEY), None);

    let sign_out = &stub.requests_to(Method::POST, "/auth/v1/logout")[0];
    assert_eq!(sign_out.header("authorization"), Some("Bearer at-1"));
    Ok(())
}

#[tokio::test]
async fn logout_clears_local_state_when_service_fails() -> anyhow::Result<()> {
    let (stub, store, tokens) = setup().await?;
    stub.respond(Method::POST, "/auth/v1/token", 200, session_json("at-2", user_json("u-2", "du@fu.cn")));
    stub.respond(Method::POST, "/auth/v1/logout", 500, json!({ "msg": "internal error" }));

    assert!(store.login("du@fu.cn", "pw").await.success);
    store.logout().await;

    assert!(!store.is_authenticated());
    assert_eq!(tokens.get(KEY), None);
    Ok(())
}

#[tokio::test]
async fn invalid_credentials_leave_state_untouched() -> anyhow::Result<()> {
    let (stub, store, tokens) = setup().await?;
    stub.respond(
        Method::POST,
        "/auth/v1/token",
        400,
        json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" }),
    );

    let result = store.login("li@bai.cn", "wrong").await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Invalid login credentials"));
    assert!(!store.is_authenticated());
    assert!(!store.is_loading());
    assert_eq!(tokens.get(KEY), None);
    Ok(())
}

#[tokio::test]
async fn unconfirmed_email_is_reported_verbatim() -> anyhow::Result<()> {
    let (stub, store, _) = setup().await?;
    stub.respond(
        Method::POST,
        "/auth/v1/token",
        400,
        json!({ "code": 400, "error_code": "email_not_confirmed", "msg": "Email not confirmed" }),
    );

    let result = store.login("wang@wei.cn", "pw").await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Email not confirmed"));
    assert_eq!(result.code, Some("REMOTE_ERROR"));
    Ok(())
}

#[tokio::test]
async fn sign_up_succeeds_even_when_profile_row_fails() -> anyhow::Result<()> {
    let (stub, store, tokens) = setup().await?;
    // Confirmation pending: GoTrue answers with a bare user
    stub.respond(Method::POST, "/auth/v1/signup", 200, user_json("u-3", "su@shi.cn"));
    stub.respond(Method::POST, "/rest/v1/users", 500, json!({ "message": "relation \"users\" does not exist" }));

    let result = store.register("su@shi.cn", "pw", &ProfileFields::default()).await;

    assert!(result.success, "{:?}", result.error);
    assert!(store.is_authenticated());
    assert!(store.session().is_none());
    assert_eq!(tokens.get(KEY), None);

    let signup = &stub.requests_to(Method::POST, "/auth/v1/signup")[0];
    assert_eq!(signup.body["email"], "su@shi.cn");

    let profile = &stub.requests_to(Method::POST, "/rest/v1/users")[0];
    assert_eq!(profile.body["id"], "u-3");
    assert_eq!(profile.body["username"], "su");
    assert_eq!(profile.body["email"], "su@shi.cn");
    assert_eq!(profile.header("prefer"), Some("return=minimal"));
    Ok(())
}

#[tokio::test]
async fn initialize_auth_resolves_restored_session() -> anyhow::Result<()> {
    let stub = StubServer::start().await?;
    stub.respond(Method::GET, "/auth/v1/user", 200, user_json("u-4", "bai@juyi.cn"));

    let tokens = Arc::new(MemoryTokenStore::with_entry(KEY, "persisted"));
    let gateway = SupabaseGateway::new(&stub.backend_config())?;
    gateway.restore_session(tokens.get(KEY));
    let store = Store::new(Arc::new(gateway), tokens, KEY);

    store.initialize_auth().await;

    assert_eq!(store.current_user().and_then(|u| u.email).as_deref(), Some("bai@juyi.cn"));
    let lookup = &stub.requests_to(Method::GET, "/auth/v1/user")[0];
    assert_eq!(lookup.header("authorization"), Some("Bearer persisted"));
    Ok(())
}

#[tokio::test]
async fn initialize_auth_swallows_rejected_token() -> anyhow::Result<()> {
    let stub = StubServer::start().await?;
    stub.respond(Method::GET, "/auth/v1/user", 401, json!({ "msg": "invalid JWT" }));

    let tokens = Arc::new(MemoryTokenStore::with_entry(KEY, "expired"));
    let gateway = SupabaseGateway::new(&stub.backend_config())?;
    gateway.restore_session(tokens.get(KEY));
    let store = Store::new(Arc::new(gateway), tokens, KEY);

    store.initialize_auth().await;

    assert!(!store.is_authenticated());
    Ok(())
}
