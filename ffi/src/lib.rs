//! C-ABI wrapper around `yampi-core`.
//!
//! # Overview
//! Exposes the auth helper and the response envelope through `extern "C"`
//! functions so any language with a C FFI can build authenticated requests
//! and parse responses while executing HTTP itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `FfiAuthRequest` is the only stateful handle; requests, results and
//!   envelopes are plain heap values.
//! - The C caller owns all returned pointers and must call the matching
//!   `yampi_free_*` function to release them.

pub mod types;

use std::os::raw::c_char;
use std::panic::catch_unwind;

use yampi_core::{AuthRequest, Credentials, HttpResponse, RequestBuilder};

use types::*;

// ---------------------------------------------------------------------------
// Handle lifecycle
// ---------------------------------------------------------------------------

/// Create a new `AuthRequest` bound to `base_url`.
///
/// Returns null if `base_url` is null or not UTF-8.
/// The caller must free the returned pointer with `yampi_auth_free`.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_new(base_url: *const c_char) -> *mut FfiAuthRequest {
    catch_unwind(|| {
        let Some(url) = (unsafe { read_str(base_url) }) else {
            return std::ptr::null_mut();
        };
        Box::into_raw(Box::new(FfiAuthRequest {
            inner: AuthRequest::new(url),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a handle created by `yampi_auth_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_free(auth: *mut FfiAuthRequest) {
    if !auth.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(auth) });
        });
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Run `f` on the handle with one string argument, mapping nulls to `NullArg`.
fn with_str_arg(
    auth: *mut FfiAuthRequest,
    arg: *const c_char,
    f: impl FnOnce(&mut AuthRequest, &str) -> FfiErrorCode + std::panic::UnwindSafe,
) -> FfiErrorCode {
    catch_unwind(|| {
        if auth.is_null() {
            return FfiErrorCode::NullArg;
        }
        let Some(arg) = (unsafe { read_str(arg) }) else {
            return FfiErrorCode::NullArg;
        };
        let auth = unsafe { &mut *auth };
        f(&mut auth.inner, arg)
    })
    .unwrap_or(FfiErrorCode::Panic)
}

/// Scope resource routes under `alias`.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_set_merchant_alias(
    auth: *mut FfiAuthRequest,
    alias: *const c_char,
) -> FfiErrorCode {
    with_str_arg(auth, alias, |a, alias| {
        a.request_mut().set_merchant_alias(alias);
        FfiErrorCode::Ok
    })
}

/// Set the route used by the next `yampi_auth_build_*` call. Clears the query.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_set_route(auth: *mut FfiAuthRequest, route: *const c_char) -> FfiErrorCode {
    with_str_arg(auth, route, |a, route| {
        let request = a.request_mut();
        request.set_route(route);
        request.clear_query();
        FfiErrorCode::Ok
    })
}

/// Add or replace a query parameter on the current route.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_set_query(
    auth: *mut FfiAuthRequest,
    key: *const c_char,
    value: *const c_char,
) -> FfiErrorCode {
    let Some(value) = (unsafe { read_str(value) }) else {
        return FfiErrorCode::NullArg;
    };
    let value = value.to_string();
    with_str_arg(auth, key, move |a, key| {
        a.request_mut().set_query(key, &value);
        FfiErrorCode::Ok
    })
}

/// Authenticate with a JWT (`Authorization: Bearer`).
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_set_jwt(auth: *mut FfiAuthRequest, jwt: *const c_char) -> FfiErrorCode {
    with_str_arg(auth, jwt, |a, jwt| {
        a.set_jwt(jwt);
        FfiErrorCode::Ok
    })
}

/// Authenticate with a user-provisioned token (`User-Token`).
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_set_user_token(
    auth: *mut FfiAuthRequest,
    token: *const c_char,
) -> FfiErrorCode {
    with_str_arg(auth, token, |a, token| {
        a.set_user_token(token);
        FfiErrorCode::Ok
    })
}

/// Configure the token from its wire type name (`bearer` or `user-token`).
///
/// Returns `InvalidTokenType` for any other name, leaving the handle unchanged.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_configure_token(
    auth: *mut FfiAuthRequest,
    token_type: *const c_char,
    token: *const c_char,
) -> FfiErrorCode {
    let Some(token) = (unsafe { read_str(token) }) else {
        return FfiErrorCode::NullArg;
    };
    let token = token.to_string();
    with_str_arg(auth, token_type, move |a, token_type| {
        match a.configure_auth_token(token_type, &token) {
            Ok(()) => FfiErrorCode::Ok,
            Err(e) => (&e).into(),
        }
    })
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the `POST auth/login` request. `mfa_code` may be null.
///
/// Returns null if `auth`, `email` or `password` is null.
/// The caller must free the returned pointer with `yampi_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_build_login(
    auth: *const FfiAuthRequest,
    email: *const c_char,
    password: *const c_char,
    mfa_code: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if auth.is_null() {
            return std::ptr::null_mut();
        }
        let (Some(email), Some(password)) = (unsafe { read_str(email) }, unsafe { read_str(password) }) else {
            return std::ptr::null_mut();
        };
        let mfa_code = unsafe { read_str(mfa_code) }.unwrap_or("");
        let auth = unsafe { &*auth };
        let credentials = Credentials::new(email, password).with_mfa_code(mfa_code);
        match auth.inner.build_login(&credentials) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a GET for the current route, carrying the auth header.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_build_get(auth: *const FfiAuthRequest) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if auth.is_null() {
            return std::ptr::null_mut();
        }
        let auth = unsafe { &*auth };
        match auth.inner.request().build_get() {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a DELETE for the current route, carrying the auth header.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_build_delete(auth: *const FfiAuthRequest) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if auth.is_null() {
            return std::ptr::null_mut();
        }
        let auth = unsafe { &*auth };
        match auth.inner.request().build_delete() {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a POST (`put == false`) or PUT (`put == true`) for the current route.
///
/// Returns null if `body_json` is null or not valid JSON.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_build_write(
    auth: *const FfiAuthRequest,
    body_json: *const c_char,
    put: bool,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if auth.is_null() {
            return std::ptr::null_mut();
        }
        let Some(raw) = (unsafe { read_str(body_json) }) else {
            return std::ptr::null_mut();
        };
        let Ok(body) = serde_json::from_str::<serde_json::Value>(raw) else {
            return std::ptr::null_mut();
        };
        let request = unsafe { &*auth }.inner.request();
        let built = if put {
            request.build_put(&body)
        } else {
            request.build_post(&body)
        };
        match built {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: unsafe { read_str(resp.body) }.unwrap_or("").to_string(),
    }
}

/// Apply a login response to the handle.
///
/// On success the handle carries the new token; on failure it is unchanged.
/// The caller must free the returned pointer with `yampi_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_parse_login(
    auth: *mut FfiAuthRequest,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        if auth.is_null() {
            return FfiResult::failure(FfiErrorCode::NullArg, "null argument: auth");
        }
        if response.is_null() {
            return FfiResult::failure(FfiErrorCode::NullArg, "null argument: response");
        }
        let auth = unsafe { &mut *auth };
        let resp = ffi_response_to_core(unsafe { &*response });
        match auth.inner.parse_login(resp) {
            Ok(_) => FfiResult::ok(),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::failure(FfiErrorCode::Panic, "panic in yampi_auth_parse_login"))
}

/// Parse the response to a request built by any `yampi_auth_build_*`.
///
/// Non-2xx statuses produce an error envelope. A 2xx body that is not JSON
/// produces an `Ok` envelope with `malformed = true` and empty data.
/// The caller must free the returned pointer with `yampi_free_envelope`.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_parse_response(
    request: *const FfiHttpRequest,
    response: *const FfiHttpResponse,
) -> *mut FfiEnvelope {
    catch_unwind(|| {
        if request.is_null() {
            return FfiEnvelope::failure(FfiErrorCode::NullArg, "null argument: request", 0);
        }
        if response.is_null() {
            return FfiEnvelope::failure(FfiErrorCode::NullArg, "null argument: response", 0);
        }
        let req = unsafe { (*request).to_core() };
        let resp = ffi_response_to_core(unsafe { &*response });
        match RequestBuilder::parse(req, resp) {
            Ok(env) => FfiEnvelope::from_core(env),
            Err(e) => FfiEnvelope::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiEnvelope::failure(FfiErrorCode::Panic, "panic in yampi_parse_response", 0))
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

/// Current token as a new C string, or null when unauthenticated.
/// Free with `yampi_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_token(auth: *const FfiAuthRequest) -> *mut c_char {
    catch_unwind(|| {
        if auth.is_null() {
            return std::ptr::null_mut();
        }
        match unsafe { &*auth }.inner.auth_token() {
            Some(token) => to_c_string(token),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_token_type(auth: *const FfiAuthRequest) -> FfiTokenType {
    catch_unwind(|| {
        if auth.is_null() {
            return FfiTokenType::None;
        }
        unsafe { &*auth }.inner.auth_token_type().into()
    })
    .unwrap_or(FfiTokenType::None)
}

/// JWT lifetime in seconds from the last login, or -1 when unknown.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_expires_in(auth: *const FfiAuthRequest) -> i64 {
    catch_unwind(|| {
        if auth.is_null() {
            return -1;
        }
        unsafe { &*auth }.inner.jwt_expires_in().unwrap_or(-1)
    })
    .unwrap_or(-1)
}

/// Logged-in user record as JSON text, or null when none is known.
/// Free with `yampi_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_auth_user_json(auth: *const FfiAuthRequest) -> *mut c_char {
    catch_unwind(|| {
        if auth.is_null() {
            return std::ptr::null_mut();
        }
        match unsafe { &*auth }.inner.user() {
            Some(user) => to_c_string(user.to_string()),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `yampi_auth_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
    });
}

/// Free an `FfiEnvelope` and every string it owns. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_free_envelope(envelope: *mut FfiEnvelope) {
    if envelope.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let env = unsafe { Box::from_raw(envelope) };
        free_c_string(env.error_message);
        free_c_string(env.data_json);
        free_c_string(env.response_json);
        free_c_string(env.pagination.previous_link);
        free_c_string(env.pagination.next_link);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn yampi_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
