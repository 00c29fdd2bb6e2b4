//! Synchronous client core for the Yampi e-commerce API.
//!
//! # Overview
//! Builds `HttpRequest` values, manages the authentication token attached
//! to them, and parses responses into a uniform `ResponseEnvelope`. The
//! HTTP round-trip goes through the `Transport` trait: `UreqTransport`
//! (feature `ureq`, on by default) for a ready-made blocking client, or any
//! host-supplied implementation, including a plain closure.
//!
//! # Design
//! - `RequestBuilder` is the generic request base: base URL, merchant
//!   alias, route, headers, query.
//! - `AuthRequest` wraps a `RequestBuilder` and owns the token. It performs
//!   the `auth/login` handshake and writes exactly one auth header.
//! - `ResponseEnvelope` lifts `data`, `meta.pagination` and `status_code`
//!   out of a response body and is immutable once built.
//! - Every networked operation also exists as a `build_*` / `parse_*` pair so
//!   callers (and the C ABI) can run the I/O themselves.
//!
//! ```no_run
//! use yampi_core::{AuthRequest, ClientConfig, UreqTransport};
//!
//! # fn main() -> Result<(), yampi_core::ApiError> {
//! let config = ClientConfig::default().with_merchant_alias("my-store");
//! let transport = UreqTransport::new(&config);
//!
//! let mut auth = AuthRequest::from_config(&config);
//! auth.login(&transport, "owner@my-store.com", "secret", "")?;
//!
//! let request = auth.request_mut();
//! request.set_route("catalog/products");
//! request.page(1);
//! let products = request.get(&transport)?;
//! println!("{} products", products.pagination().map_or(0, |p| p.total));
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod pagination;
pub mod request;
#[cfg(feature = "ureq")]
pub mod transport;

pub use auth::{AuthRequest, AuthSession, Credentials, TokenType};
pub use config::ClientConfig;
pub use envelope::ResponseEnvelope;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use pagination::{Pagination, PaginationLinks};
pub use request::RequestBuilder;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
