//! Generic request builder for the Yampi API.
//!
//! # Design
//! `RequestBuilder` holds the per-client state every call needs (base URL,
//! merchant alias, headers) plus the route and query of the next call.
//! Setters mutate in place and return nothing; a request only exists once
//! one of the `build_*` methods turns the current state into an
//! `HttpRequest`. Executing it is the `Transport`'s job, and `parse` turns
//! the `HttpResponse` back into a `ResponseEnvelope`. `get`/`post`/`put`/
//! `delete` chain the three steps for callers that hand over a transport.

use serde::Serialize;
use url::Url;

use crate::config::ClientConfig;
use crate::envelope::ResponseEnvelope;
use crate::error::ApiError;
use crate::http::{find_header, HttpMethod, HttpRequest, HttpResponse, Transport};

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
    merchant_alias: Option<String>,
    route: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl RequestBuilder {
    pub fn new(base_url: &str) -> Self {
        Self::from_config(&ClientConfig::new(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            merchant_alias: None,
            route: String::new(),
            headers: Vec::new(),
            query: Vec::new(),
        };
        builder.set_header("accept", "application/json");
        builder.set_header("user-agent", &config.user_agent);
        if let Some(alias) = &config.merchant_alias {
            builder.set_merchant_alias(alias);
        }
        builder
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn merchant_alias(&self) -> Option<&str> {
        self.merchant_alias.as_deref()
    }

    /// Scope subsequent routes under `{base_url}/{alias}/`.
    pub fn set_merchant_alias(&mut self, alias: &str) {
        let alias = alias.trim_matches('/');
        self.merchant_alias = (!alias.is_empty()).then(|| alias.to_string());
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn set_route(&mut self, route: &str) {
        self.route = route.trim_matches('/').to_string();
    }

    /// Replace the header with the same (case-insensitive) name, or append.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Replace the query parameter with the same name, or append.
    pub fn set_query(&mut self, key: &str, value: &str) {
        match self.query.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.query.push((key.to_string(), value.to_string())),
        }
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn page(&mut self, page: u64) {
        self.set_query("page", &page.to_string());
    }

    pub fn limit(&mut self, limit: u64) {
        self.set_query("limit", &limit.to_string());
    }

    /// Comma-separated relations to embed, e.g. `"skus,images"`.
    pub fn include(&mut self, relations: &str) {
        self.set_query("include", relations);
    }

    pub fn search(&mut self, term: &str) {
        self.set_query("q", term);
    }

    pub fn build_get(&self) -> Result<HttpRequest, ApiError> {
        self.build(HttpMethod::Get, None, true)
    }

    pub fn build_delete(&self) -> Result<HttpRequest, ApiError> {
        self.build(HttpMethod::Delete, None, true)
    }

    pub fn build_post<T: Serialize + ?Sized>(&self, body: &T) -> Result<HttpRequest, ApiError> {
        self.build(HttpMethod::Post, Some(to_json(body)?), true)
    }

    pub fn build_put<T: Serialize + ?Sized>(&self, body: &T) -> Result<HttpRequest, ApiError> {
        self.build(HttpMethod::Put, Some(to_json(body)?), true)
    }

    /// Build a POST against `{base_url}/{route}`, ignoring the merchant alias.
    pub(crate) fn build_unscoped_post<T: Serialize + ?Sized>(
        &self,
        route: &str,
        body: &T,
    ) -> Result<HttpRequest, ApiError> {
        let mut builder = self.clone();
        builder.set_route(route);
        builder.clear_query();
        builder.build(HttpMethod::Post, Some(to_json(body)?), false)
    }

    /// Absolute URL of the current route, query included.
    pub fn url(&self) -> Result<String, ApiError> {
        self.url_with_scope(true)
    }

    fn url_with_scope(&self, scoped: bool) -> Result<String, ApiError> {
        let mut raw = self.base_url.clone();
        if let Some(alias) = self.merchant_alias.as_deref().filter(|_| scoped) {
            raw.push('/');
            raw.push_str(alias);
        }
        if !self.route.is_empty() {
            raw.push('/');
            raw.push_str(&self.route);
        }
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url.into())
    }

    fn build(
        &self,
        method: HttpMethod,
        body: Option<String>,
        scoped: bool,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = self.headers.clone();
        if body.is_some() && find_header(&headers, "content-type").is_none() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        let request = HttpRequest {
            method,
            url: self.url_with_scope(scoped)?,
            headers,
            body,
        };
        tracing::debug!(
            method = request.method.as_str(),
            url = %request.url,
            headers = ?request.headers.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            "built request"
        );
        Ok(request)
    }

    /// Map the response to an envelope, or to an error for non-2xx statuses.
    pub fn parse(request: HttpRequest, response: HttpResponse) -> Result<ResponseEnvelope, ApiError> {
        check_status(&response)?;
        Ok(ResponseEnvelope::from_response(request, response))
    }

    pub fn send<T: Transport + ?Sized>(
        &self,
        transport: &T,
        request: HttpRequest,
    ) -> Result<ResponseEnvelope, ApiError> {
        let response = transport.execute(request.clone())?;
        Self::parse(request, response)
    }

    pub fn get<T: Transport + ?Sized>(&self, transport: &T) -> Result<ResponseEnvelope, ApiError> {
        self.send(transport, self.build_get()?)
    }

    pub fn delete<T: Transport + ?Sized>(&self, transport: &T) -> Result<ResponseEnvelope, ApiError> {
        self.send(transport, self.build_delete()?)
    }

    pub fn post<T: Transport + ?Sized, B: Serialize + ?Sized>(
        &self,
        transport: &T,
        body: &B,
    ) -> Result<ResponseEnvelope, ApiError> {
        self.send(transport, self.build_post(body)?)
    }

    pub fn put<T: Transport + ?Sized, B: Serialize + ?Sized>(
        &self,
        transport: &T,
        body: &B,
    ) -> Result<ResponseEnvelope, ApiError> {
        self.send(transport, self.build_put(body)?)
    }
}

fn to_json<T: Serialize + ?Sized>(body: &T) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
pub(crate) fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn builder() -> RequestBuilder {
        RequestBuilder::new("http://localhost:3000")
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_get_joins_base_alias_and_route() {
        let mut b = builder();
        b.set_merchant_alias("demo-store");
        b.set_route("/catalog/products/");
        let req = b.build_get().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/demo-store/catalog/products");
        assert!(req.body.is_none());
        assert_eq!(req.header("accept"), Some("application/json"));
        assert!(req.header("user-agent").unwrap().starts_with("yampi-core/"));
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let mut b = RequestBuilder::new("http://localhost:3000/");
        b.set_route("orders");
        assert_eq!(b.url().unwrap(), "http://localhost:3000/orders");
    }

    #[test]
    fn empty_alias_is_ignored() {
        let mut b = builder();
        b.set_merchant_alias("/");
        assert!(b.merchant_alias().is_none());
    }

    #[test]
    fn query_parameters_are_encoded() {
        let mut b = builder();
        b.set_route("catalog/products");
        b.page(2);
        b.limit(50);
        b.search("blue shirt & cap");
        b.include("skus,images");
        b.page(3);
        let url = b.url().unwrap();
        assert_eq!(
            url,
            "http://localhost:3000/catalog/products?page=3&limit=50&q=blue+shirt+%26+cap&include=skus%2Cimages"
        );
        b.clear_query();
        assert_eq!(b.url().unwrap(), "http://localhost:3000/catalog/products");
    }

    #[test]
    fn build_post_serializes_json_body() {
        let mut b = builder();
        b.set_route("customers");
        let req = b.build_post(&json!({"name": "Ana"})).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "Ana");
    }

    #[test]
    fn build_put_and_delete_use_their_methods() {
        let mut b = builder();
        b.set_route("orders/9");
        assert_eq!(b.build_put(&json!({})).unwrap().method, HttpMethod::Put);
        assert_eq!(b.build_delete().unwrap().method, HttpMethod::Delete);
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut b = builder();
        b.set_header("X-Trace", "1");
        b.set_header("x-trace", "2");
        assert_eq!(b.headers().iter().filter(|(k, _)| k.eq_ignore_ascii_case("x-trace")).count(), 1);
        assert_eq!(b.header("X-TRACE"), Some("2"));
        b.remove_header("X-Trace");
        assert!(b.header("x-trace").is_none());
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let b = RequestBuilder::new("not a url");
        let err = b.build_get().unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn unscoped_post_ignores_alias_and_query() {
        let mut b = builder();
        b.set_merchant_alias("demo");
        b.set_route("catalog/products");
        b.page(4);
        let req = b.build_unscoped_post("auth/login", &json!({})).unwrap();
        assert_eq!(req.url, "http://localhost:3000/auth/login");
        assert_eq!(b.route(), "catalog/products");
    }

    #[test]
    fn from_config_applies_alias_and_user_agent() {
        let config = ClientConfig::new("http://localhost:3000")
            .with_merchant_alias("demo")
            .with_user_agent("shop-sync/1.0");
        let b = RequestBuilder::from_config(&config);
        assert_eq!(b.merchant_alias(), Some("demo"));
        assert_eq!(b.header("user-agent"), Some("shop-sync/1.0"));
    }

    #[test]
    fn parse_maps_statuses() {
        let req = builder().build_get().unwrap();
        let not_found = HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(matches!(
            RequestBuilder::parse(req.clone(), not_found).unwrap_err(),
            ApiError::NotFound
        ));

        let unauthorized = HttpResponse {
            status: 401,
            headers: Vec::new(),
            body: r#"{"message":"Unauthenticated."}"#.to_string(),
        };
        let err = RequestBuilder::parse(req.clone(), unauthorized).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 401, .. }));

        let env = RequestBuilder::parse(req, ok(r#"{"data":[1]}"#)).unwrap();
        assert_eq!(env.data(), &json!([1]));
        assert_eq!(env.http_status(), Some(200));
    }

    #[test]
    fn get_executes_through_transport() {
        let seen = RefCell::new(Vec::new());
        let transport = |req: HttpRequest| -> Result<HttpResponse, ApiError> {
            seen.borrow_mut().push(req.url.clone());
            Ok(ok(r#"{"data":[{"id":1}],"meta":{"pagination":{"total":1}}}"#))
        };
        let mut b = builder();
        b.set_route("catalog/brands");
        let env = b.get(&transport).unwrap();
        assert_eq!(env.pagination().unwrap().total, 1);
        assert_eq!(seen.borrow().as_slice(), ["http://localhost:3000/catalog/brands"]);
    }

    #[test]
    fn transport_errors_propagate_unchanged() {
        let transport =
            |_: HttpRequest| -> Result<HttpResponse, ApiError> { Err(ApiError::Transport("connection refused".into())) };
        let err = builder().post(&transport, &json!({})).unwrap_err();
        assert!(matches!(err, ApiError::Transport(ref m) if m == "connection refused"));
    }
}
