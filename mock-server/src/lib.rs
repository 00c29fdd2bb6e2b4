//! In-memory stand-in for the Yampi API, used by the client's tests.
//!
//! Serves `POST /auth/login`, `GET /auth/me` and a paginated
//! `GET /{alias}/catalog/products`. Protected routes accept either
//! `Authorization: Bearer <jwt>` (issued by login) or a pre-provisioned
//! `User-Token`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "owner@demo.test";
pub const DEMO_PASSWORD: &str = "secret";
pub const DEMO_USER_TOKEN: &str = "ut-demo";
pub const MFA_EMAIL: &str = "mfa@demo.test";
pub const MFA_CODE: &str = "123456";
pub const JWT_TTL_SECS: i64 = 3600;
pub const PRODUCT_COUNT: u64 = 23;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub mfa_code: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

struct Account {
    user: User,
    password: String,
    mfa_code: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    accounts: Arc<Vec<Account>>,
    tokens: Arc<RwLock<HashMap<String, u64>>>,
    products: Arc<Vec<Product>>,
}

type ApiFailure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, message: &str) -> ApiFailure {
    (
        status,
        Json(json!({"message": message, "status_code": status.as_u16()})),
    )
}

impl AppState {
    fn seeded() -> Self {
        let accounts = vec![
            Account {
                user: User {
                    id: 1,
                    name: "Demo Owner".to_string(),
                    email: DEMO_EMAIL.to_string(),
                },
                password: DEMO_PASSWORD.to_string(),
                mfa_code: None,
            },
            Account {
                user: User {
                    id: 2,
                    name: "Guarded Owner".to_string(),
                    email: MFA_EMAIL.to_string(),
                },
                password: DEMO_PASSWORD.to_string(),
                mfa_code: Some(MFA_CODE.to_string()),
            },
        ];
        let products = (1..=PRODUCT_COUNT)
            .map(|id| Product {
                id,
                name: format!("Product {id}"),
                price: 9.9 * id as f64,
            })
            .collect();
        let tokens = HashMap::from([(DEMO_USER_TOKEN.to_string(), 1)]);
        Self {
            accounts: Arc::new(accounts),
            tokens: Arc::new(RwLock::new(tokens)),
            products: Arc::new(products),
        }
    }

    fn user(&self, id: u64) -> Option<&User> {
        self.accounts.iter().map(|a| &a.user).find(|u| u.id == id)
    }

    async fn authenticate(&self, headers: &HeaderMap) -> Result<User, ApiFailure> {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let user_token = headers.get("user-token").and_then(|v| v.to_str().ok());
        let token = bearer
            .or(user_token)
            .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Unauthenticated."))?;

        let tokens = self.tokens.read().await;
        tokens
            .get(token)
            .and_then(|id| self.user(*id))
            .cloned()
            .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Unauthenticated."))
    }
}

pub fn app() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/{alias}/catalog/products", get(list_products))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::seeded())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<Value>, ApiFailure> {
    let account = state
        .accounts
        .iter()
        .find(|a| a.user.email == input.email && a.password == input.password)
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Invalid credentials."))?;

    if let Some(code) = &account.mfa_code {
        if *code != input.mfa_code {
            return Err(failure(StatusCode::UNPROCESSABLE_ENTITY, "Invalid MFA code."));
        }
    }

    let token = format!("jwt-{}", Uuid::new_v4());
    state
        .tokens
        .write()
        .await
        .insert(token.clone(), account.user.id);
    tracing::info!(user_id = account.user.id, "issued token");

    Ok(Json(json!({
        "token_type": "bearer",
        "access_token": token,
        "user": account.user,
        "expires_in": JWT_TTL_SECS,
    })))
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiFailure> {
    let user = state.authenticate(&headers).await?;
    Ok(Json(json!({ "data": user })))
}

async fn list_products(
    State(state): State<AppState>,
    Path(alias): Path<String>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiFailure> {
    state.authenticate(&headers).await?;

    let total = state.products.len() as u64;
    let per_page = params.limit.unwrap_or(10).clamp(1, 100);
    let total_pages = total.div_ceil(per_page);
    let current_page = params.page.unwrap_or(1).max(1);

    let start = ((current_page - 1) * per_page).min(total) as usize;
    let end = (current_page * per_page).min(total) as usize;
    let items = &state.products[start..end];

    let page_link = |page: u64| format!("/{alias}/catalog/products?page={page}&limit={per_page}");
    let mut links = serde_json::Map::new();
    if current_page > 1 {
        links.insert("previous".to_string(), json!(page_link(current_page - 1)));
    }
    if current_page < total_pages {
        links.insert("next".to_string(), json!(page_link(current_page + 1)));
    }
    // Empty link maps are rendered as `[]`, like the real API.
    let links = if links.is_empty() { json!([]) } else { Value::Object(links) };

    Ok(Json(json!({
        "data": items,
        "meta": {
            "pagination": {
                "total": total,
                "count": items.len(),
                "per_page": per_page,
                "current_page": current_page,
                "total_pages": total_pages,
                "links": links,
            }
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_defaults_mfa_code_to_empty() {
        let input: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"x"}"#).unwrap();
        assert_eq!(input.email, "a@b.c");
        assert!(input.mfa_code.is_empty());
    }

    #[test]
    fn login_request_rejects_missing_password() {
        let result: Result<LoginRequest, _> = serde_json::from_str(r#"{"email":"a@b.c"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn seeded_state_knows_demo_user_token() {
        let state = AppState::seeded();
        let tokens = state.tokens.try_read().unwrap();
        assert_eq!(tokens.get(DEMO_USER_TOKEN), Some(&1));
        assert_eq!(state.products.len() as u64, PRODUCT_COUNT);
        assert_eq!(state.user(2).unwrap().email, MFA_EMAIL);
    }

    #[test]
    fn failure_echoes_status_in_body() {
        let (status, Json(body)) = failure(StatusCode::UNAUTHORIZED, "nope");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status_code"], 401);
        assert_eq!(body["message"], "nope");
    }
}
