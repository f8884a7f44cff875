use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::RecordId;

/// Signed-in principal as reported by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn username(&self) -> Option<&str> {
        self.user_metadata.get("username").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Session {
    /// A session that is nothing more than a bearer token
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("bearer".to_string()),
            expires_in: None,
            expires_at: None,
            refresh_token: None,
            user: None,
        }
    }
}

/// Outcome of sign-in / sign-up. A sign-up that still needs email
/// confirmation yields a user without a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: Option<User>,
    pub session: Option<Session>,
}

impl AuthResponse {
    /// Interpret the three body shapes GoTrue answers auth calls with:
    /// a session object, `{user, session}`, or a bare user.
    pub fn from_gotrue(body: Value) -> Result<Self, serde_json::Error> {
        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)?;
            return Ok(Self { user: session.user.clone(), session: Some(session) });
        }
        if body.get("user").is_some() || body.get("session").is_some() {
            let user = match body.get("user") {
                Some(Value::Null) | None => None,
                Some(u) => Some(serde_json::from_value(u.clone())?),
            };
            let session = match body.get("session") {
                Some(Value::Null) | None => None,
                Some(s) => Some(serde_json::from_value::<Session>(s.clone())?),
            };
            return Ok(Self { user, session });
        }
        if body.get("id").is_some() {
            return Ok(Self { user: Some(serde_json::from_value(body)?), session: None });
        }
        Ok(Self::default())
    }
}

/// Extra profile fields supplied at registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfileFields {
    pub fn with_username(username: impl Into<String>) -> Self {
        Self { username: Some(username.into()), extra: Map::new() }
    }
}

/// Row written to the `users` table after a successful sign-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl ProfileRow {
    pub fn for_sign_up(user: &User, email: &str, profile: &ProfileFields) -> Self {
        let username = profile
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());
        Self {
            id: user.id.clone(),
            username,
            email: email.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_body_carries_user() {
        let body = json!({
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": { "id": "9b1d", "email": "li@bai.cn", "user_metadata": { "username": "libai" } }
        });
        let resp = AuthResponse::from_gotrue(body).unwrap();
        assert_eq!(resp.session.as_ref().unwrap().access_token, "at");
        assert_eq!(resp.user.as_ref().unwrap().username(), Some("libai"));
    }

    #[test]
    fn bare_user_body_has_no_session() {
        let body = json!({ "id": "9b1d", "email": "du@fu.cn", "confirmation_sent_at": "2024-01-01T00:00:00Z" });
        let resp = AuthResponse::from_gotrue(body).unwrap();
        assert!(resp.session.is_none());
        assert_eq!(resp.user.unwrap().email.as_deref(), Some("du@fu.cn"));
    }

    #[test]
    fn wrapped_body_with_null_session() {
        let body = json!({ "user": { "id": "1" }, "session": null });
        let resp = AuthResponse::from_gotrue(body).unwrap();
        assert!(resp.user.is_some());
        assert!(resp.session.is_none());
    }

    #[test]
    fn profile_row_falls_back_to_email_local_part() {
        let user: User = serde_json::from_value(json!({ "id": "u1" })).unwrap();
        let row = ProfileRow::for_sign_up(&user, "wangwei@tang.cn", &ProfileFields::default());
        assert_eq!(row.username, "wangwei");

        let named = ProfileRow::for_sign_up(&user, "wangwei@tang.cn", &ProfileFields::with_username("摩诘"));
        assert_eq!(named.username, "摩诘");

        let blank = ProfileRow::for_sign_up(&user, "wangwei@tang.cn", &ProfileFields::with_username(""));
        assert_eq!(blank.username, "wangwei");
    }

    #[test]
    fn profile_fields_flatten_extras() {
        let mut fields = ProfileFields::with_username("su");
        fields.extra.insert("avatar_url".to_string(), json!("a.png"));
        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(value, json!({ "username": "su", "avatar_url": "a.png" }));
    }
}
