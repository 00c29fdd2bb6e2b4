//! Authentication on top of `RequestBuilder`.
//!
//! # Design
//! `AuthRequest` owns a `RequestBuilder` and at most one `AuthSession`.
//! Configuring a token writes exactly one auth header into the builder and
//! removes the other kind, so a request never carries both `Authorization`
//! and `User-Token`. There is no logout: dropping the `AuthRequest` is the
//! only way back to an unauthenticated state.
//!
//! Login is split into `build_login` and `parse_login` like every other
//! call; `login` runs both around a `Transport`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::request::{check_status, RequestBuilder};

pub const LOGIN_ROUTE: &str = "auth/login";

const AUTHORIZATION: &str = "Authorization";
const USER_TOKEN: &str = "User-Token";

/// Kind of credential attached to outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// JWT sent as `Authorization: Bearer <token>`.
    #[serde(rename = "bearer")]
    Bearer,
    /// Opaque token sent as `User-Token: <token>`.
    #[serde(rename = "user-token")]
    UserToken,
}

impl TokenType {
    pub const AVAILABLE: [&'static str; 2] = ["bearer", "user-token"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Bearer => "bearer",
            TokenType::UserToken => "user-token",
        }
    }

    pub fn header_name(&self) -> &'static str {
        match self {
            TokenType::Bearer => AUTHORIZATION,
            TokenType::UserToken => USER_TOKEN,
        }
    }

    pub fn header_value(&self, token: &str) -> String {
        match self {
            TokenType::Bearer => format!("Bearer {token}"),
            TokenType::UserToken => token.to_string(),
        }
    }

    fn other(&self) -> TokenType {
        match self {
            TokenType::Bearer => TokenType::UserToken,
            TokenType::UserToken => TokenType::Bearer,
        }
    }
}

impl FromStr for TokenType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bearer" => Ok(TokenType::Bearer),
            "user-token" => Ok(TokenType::UserToken),
            other => Err(ApiError::InvalidTokenType(other.to_string())),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login payload, serialized as `{email, password, mfa_code}`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub mfa_code: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            mfa_code: String::new(),
        }
    }

    pub fn with_mfa_code(mut self, code: &str) -> Self {
        self.mfa_code = code.to_string();
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("mfa_code", &"<redacted>")
            .finish()
    }
}

/// The credential currently attached to an `AuthRequest`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub token_type: TokenType,
    /// The logged-in user record, opaque to this crate.
    pub user: Option<Value>,
    pub expires_in: Option<i64>,
}

/// Success body of `POST auth/login`.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token_type: String,
    access_token: String,
    #[serde(default)]
    user: Option<Value>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct AuthRequest {
    request: RequestBuilder,
    session: Option<AuthSession>,
}

impl AuthRequest {
    pub fn new(base_url: &str) -> Self {
        Self::with_request(RequestBuilder::new(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_request(RequestBuilder::from_config(config))
    }

    pub fn with_request(request: RequestBuilder) -> Self {
        Self {
            request,
            session: None,
        }
    }

    /// The builder that carries the auth header.
    pub fn request(&self) -> &RequestBuilder {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut RequestBuilder {
        &mut self.request
    }

    pub fn into_request(self) -> RequestBuilder {
        self.request
    }

    /// Authenticate with a user-provisioned token (`User-Token` header).
    pub fn set_user_token(&mut self, token: &str) {
        self.apply_token(TokenType::UserToken, token);
    }

    /// Authenticate with a JWT (`Authorization: Bearer` header).
    pub fn set_jwt(&mut self, jwt: &str) {
        self.apply_token(TokenType::Bearer, jwt);
    }

    /// Configure the token from its wire type name.
    ///
    /// Fails with `InvalidTokenType` for anything but `bearer` or
    /// `user-token`, leaving the current token and headers untouched.
    pub fn configure_auth_token(&mut self, token_type: &str, token: &str) -> Result<(), ApiError> {
        let token_type = token_type.parse::<TokenType>()?;
        self.apply_token(token_type, token);
        Ok(())
    }

    /// Swap token and type; the user and expiry from the last login stay.
    fn apply_token(&mut self, token_type: TokenType, token: &str) {
        let (user, expires_in) = match self.session.take() {
            Some(previous) => (previous.user, previous.expires_in),
            None => (None, None),
        };
        self.install(AuthSession {
            token: token.to_string(),
            token_type,
            user,
            expires_in,
        });
    }

    fn install(&mut self, session: AuthSession) -> &AuthSession {
        let token_type = session.token_type;
        self.request.remove_header(token_type.other().header_name());
        self.request
            .set_header(token_type.header_name(), &token_type.header_value(&session.token));
        tracing::info!(token_type = %token_type, "auth token configured");
        self.session.insert(session)
    }

    /// Build `POST {base_url}/auth/login`. The merchant alias is not applied.
    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.request.build_unscoped_post(LOGIN_ROUTE, credentials)
    }

    /// Apply a login response: configure the token, then store user and expiry.
    ///
    /// Nothing changes unless the response is a 2xx carrying a valid
    /// `token_type` and `access_token`.
    pub fn parse_login(&mut self, response: HttpResponse) -> Result<&AuthSession, ApiError> {
        check_status(&response)?;
        let login: LoginResponse = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::MalformedResponse(format!("login response: {e}")))?;
        let token_type = login.token_type.parse::<TokenType>()?;
        tracing::info!(token_type = %token_type, expires_in = ?login.expires_in, "logged in");
        Ok(self.install(AuthSession {
            token: login.access_token,
            token_type,
            user: login.user,
            expires_in: login.expires_in,
        }))
    }

    /// Exchange credentials for a token in one round-trip.
    pub fn login<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        username: &str,
        password: &str,
        mfa_code: &str,
    ) -> Result<&AuthSession, ApiError> {
        let credentials = Credentials::new(username, password).with_mfa_code(mfa_code);
        let request = self.build_login(&credentials)?;
        let response = transport.execute(request)?;
        self.parse_login(response)
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn user(&self) -> Option<&Value> {
        self.session.as_ref().and_then(|s| s.user.as_ref())
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn auth_token_type(&self) -> Option<TokenType> {
        self.session.as_ref().map(|s| s.token_type)
    }

    /// Lifetime of the JWT in seconds, as reported by the last login.
    pub fn jwt_expires_in(&self) -> Option<i64> {
        self.session.as_ref().and_then(|s| s.expires_in)
    }

    /// Expiry as a unix timestamp, given when the login response arrived.
    pub fn jwt_expires_at(&self, issued_at: i64) -> Option<i64> {
        self.jwt_expires_in().map(|secs| issued_at.saturating_add(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use serde_json::json;

    fn auth() -> AuthRequest {
        AuthRequest::new("http://localhost:3000")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn starts_unauthenticated() {
        let a = auth();
        assert!(!a.is_authenticated());
        assert!(a.auth_token().is_none());
        assert!(a.auth_token_type().is_none());
        assert!(a.user().is_none());
        assert!(a.jwt_expires_in().is_none());
        assert!(a.request().header("authorization").is_none());
    }

    #[test]
    fn configure_bearer_sets_authorization_header() {
        let mut a = auth();
        a.configure_auth_token("bearer", "jwt-1").unwrap();
        assert_eq!(a.auth_token(), Some("jwt-1"));
        assert_eq!(a.auth_token_type(), Some(TokenType::Bearer));
        assert_eq!(a.request().header("Authorization"), Some("Bearer jwt-1"));
        assert!(a.request().header("User-Token").is_none());
    }

    #[test]
    fn configure_user_token_sets_user_token_header() {
        let mut a = auth();
        a.configure_auth_token("user-token", "ut-1").unwrap();
        assert_eq!(a.auth_token(), Some("ut-1"));
        assert_eq!(a.auth_token_type(), Some(TokenType::UserToken));
        assert_eq!(a.request().header("User-Token"), Some("ut-1"));
        assert!(a.request().header("Authorization").is_none());
    }

    #[test]
    fn invalid_token_type_leaves_state_unchanged() {
        let mut a = auth();
        a.set_jwt("keep-me");
        let before = a.request().headers().to_vec();

        for bad in ["basic", "Bearer", "", "user_token"] {
            let err = a.configure_auth_token(bad, "other").unwrap_err();
            assert!(matches!(err, ApiError::InvalidTokenType(ref t) if t == bad));
        }
        assert_eq!(a.auth_token(), Some("keep-me"));
        assert_eq!(a.auth_token_type(), Some(TokenType::Bearer));
        assert_eq!(a.request().headers(), before.as_slice());
    }

    #[test]
    fn switching_token_type_clears_previous_header() {
        let mut a = auth();
        a.set_user_token("abc");
        a.set_jwt("xyz");
        assert_eq!(a.auth_token(), Some("xyz"));
        assert_eq!(a.auth_token_type(), Some(TokenType::Bearer));
        assert_eq!(a.request().header("Authorization"), Some("Bearer xyz"));
        assert!(a.request().header("User-Token").is_none());

        a.set_user_token("abc");
        assert!(a.request().header("Authorization").is_none());
        assert_eq!(a.request().header("User-Token"), Some("abc"));
    }

    #[test]
    fn auth_header_reaches_built_requests() {
        let mut a = auth();
        a.set_jwt("jwt-9");
        a.request_mut().set_merchant_alias("demo");
        a.request_mut().set_route("orders");
        let req = a.request().build_get().unwrap();
        assert_eq!(req.url, "http://localhost:3000/demo/orders");
        assert_eq!(req.header("authorization"), Some("Bearer jwt-9"));
    }

    #[test]
    fn build_login_posts_credentials() {
        let mut a = auth();
        a.request_mut().set_merchant_alias("demo");
        let creds = Credentials::new("me@example.com", "s3cret");
        let req = a.build_login(&creds).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/auth/login");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"email": "me@example.com", "password": "s3cret", "mfa_code": ""}));
    }

    #[test]
    fn parse_login_stores_session() {
        let mut a = auth();
        let session = a
            .parse_login(response(
                200,
                r#"{"token_type":"bearer","access_token":"tok1","user":{"id":1},"expires_in":3600}"#,
            ))
            .unwrap();
        assert_eq!(session.token, "tok1");
        assert_eq!(a.auth_token(), Some("tok1"));
        assert_eq!(a.auth_token_type(), Some(TokenType::Bearer));
        assert_eq!(a.user(), Some(&json!({"id": 1})));
        assert_eq!(a.jwt_expires_in(), Some(3600));
        assert_eq!(a.jwt_expires_at(1_700_000_000), Some(1_700_003_600));
        assert_eq!(a.request().header("Authorization"), Some("Bearer tok1"));
    }

    #[test]
    fn refreshing_jwt_keeps_login_user_and_expiry() {
        let mut a = auth();
        a.parse_login(response(
            200,
            r#"{"token_type":"bearer","access_token":"tok1","user":{"id":1},"expires_in":3600}"#,
        ))
        .unwrap();

        a.set_jwt("refreshed");
        assert_eq!(a.auth_token(), Some("refreshed"));
        assert_eq!(a.request().header("Authorization"), Some("Bearer refreshed"));
        assert_eq!(a.user(), Some(&json!({"id": 1})));
        assert_eq!(a.jwt_expires_in(), Some(3600));

        a.configure_auth_token("user-token", "ut-2").unwrap();
        assert_eq!(a.auth_token_type(), Some(TokenType::UserToken));
        assert_eq!(a.user(), Some(&json!({"id": 1})));
        assert!(a.request().header("Authorization").is_none());
    }

    #[test]
    fn into_request_carries_auth_header() {
        let mut a = auth();
        a.set_user_token("ut-3");
        let request = a.into_request();
        assert_eq!(request.header("User-Token"), Some("ut-3"));
        assert_eq!(request.base_url(), "http://localhost:3000");
    }

    #[test]
    fn login_with_user_token_response() {
        let mut a = auth();
        a.parse_login(response(200, r#"{"token_type":"user-token","access_token":"ut-7"}"#))
            .unwrap();
        assert_eq!(a.auth_token_type(), Some(TokenType::UserToken));
        assert_eq!(a.request().header("User-Token"), Some("ut-7"));
        assert!(a.user().is_none());
        assert!(a.jwt_expires_in().is_none());
    }

    #[test]
    fn failed_login_keeps_previous_session() {
        let mut a = auth();
        a.set_user_token("old");

        let err = a.parse_login(response(401, r#"{"message":"Invalid credentials"}"#)).unwrap_err();
        assert!(err.is_request_error());

        let err = a.parse_login(response(200, r#"{"token_type":"bearer"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));

        let err = a
            .parse_login(response(200, r#"{"token_type":"mac","access_token":"t"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidTokenType(_)));

        assert_eq!(a.auth_token(), Some("old"));
        assert_eq!(a.request().header("User-Token"), Some("old"));
    }

    #[test]
    fn login_runs_through_transport() {
        let transport = |req: HttpRequest| -> Result<HttpResponse, ApiError> {
            let body: Value = serde_json::from_str(req.body.as_deref().unwrap_or("{}")).unwrap();
            assert_eq!(body["mfa_code"], "123456");
            Ok(response(
                200,
                r#"{"token_type":"bearer","access_token":"tok2","user":{"id":5},"expires_in":60}"#,
            ))
        };
        let mut a = auth();
        a.login(&transport, "me@example.com", "pw", "123456").unwrap();
        assert_eq!(a.auth_token(), Some("tok2"));
        assert_eq!(a.jwt_expires_in(), Some(60));
    }

    #[test]
    fn transport_failure_propagates() {
        let transport =
            |_: HttpRequest| -> Result<HttpResponse, ApiError> { Err(ApiError::Transport("timed out".into())) };
        let mut a = auth();
        let err = a.login(&transport, "me@example.com", "pw", "").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(!a.is_authenticated());
    }

    #[test]
    fn token_type_round_trips_wire_names() {
        for name in TokenType::AVAILABLE {
            let t: TokenType = name.parse().unwrap();
            assert_eq!(t.to_string(), name);
            assert_eq!(serde_json::to_value(t).unwrap(), json!(name));
        }
    }

    #[test]
    fn credentials_debug_redacts_secrets() {
        let creds = Credentials::new("me@example.com", "hunter2").with_mfa_code("000111");
        let printed = format!("{creds:?}");
        assert!(printed.contains("me@example.com"));
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("000111"));
    }
}
