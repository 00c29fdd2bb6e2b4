//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. JSON payloads (`data`, the user
//! record) cross as serialized strings. Conversion functions live here to
//! keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use yampi_core::{ApiError, AuthRequest, HttpMethod, HttpRequest, Pagination, ResponseEnvelope, TokenType};

/// Opaque handle to an `AuthRequest`. C callers receive a pointer to this
/// and pass it back into every `yampi_auth_*` function.
pub struct FfiAuthRequest {
    pub(crate) inner: AuthRequest,
}

/// Allocate a C string. Interior NULs yield an empty string.
pub(crate) fn to_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Borrow a C string argument as UTF-8. Null or invalid UTF-8 yields `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Free a C string allocated by `to_c_string`. Null is ignored.
pub(crate) fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `yampi_auth_build_*` functions. The C caller executes it and
/// passes the response back through `yampi_auth_parse_login` or
/// `yampi_parse_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: usize,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let url = to_c_string(req.url);
        let body = match req.body {
            Some(b) => to_c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len();
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
        }))
    }

    /// Read the request back into a core `HttpRequest`.
    ///
    /// # Safety
    /// All pointers must be null or valid as produced by `from_core`.
    pub(crate) unsafe fn to_core(&self) -> HttpRequest {
        let headers = if self.headers.is_null() || self.headers_len == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(self.headers, self.headers_len) }
                .iter()
                .filter_map(|h| {
                    let key = unsafe { read_str(h.key) }?;
                    let value = unsafe { read_str(h.value) }?;
                    Some((key.to_string(), value.to_string()))
                })
                .collect()
        };
        HttpRequest {
            method: self.method.into(),
            url: unsafe { read_str(self.url) }.unwrap_or("").to_string(),
            headers,
            body: unsafe { read_str(self.body) }.map(str::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request.
/// The FFI layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned across the boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Http = 2,
    Transport = 3,
    MalformedResponse = 4,
    InvalidTokenType = 5,
    InvalidUrl = 6,
    Serialization = 7,
    Panic = 8,
    NullArg = 9,
}

impl From<&ApiError> for FfiErrorCode {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::NotFound => FfiErrorCode::NotFound,
            ApiError::HttpError { .. } => FfiErrorCode::Http,
            ApiError::Transport(_) => FfiErrorCode::Transport,
            ApiError::MalformedResponse(_) => FfiErrorCode::MalformedResponse,
            ApiError::InvalidTokenType(_) => FfiErrorCode::InvalidTokenType,
            ApiError::InvalidUrl(_) => FfiErrorCode::InvalidUrl,
            ApiError::SerializationError(_) => FfiErrorCode::Serialization,
        }
    }
}

/// Token type as a C enum; `None` when unauthenticated.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiTokenType {
    None = 0,
    Bearer = 1,
    UserToken = 2,
}

impl From<Option<TokenType>> for FfiTokenType {
    fn from(t: Option<TokenType>) -> Self {
        match t {
            None => FfiTokenType::None,
            Some(TokenType::Bearer) => FfiTokenType::Bearer,
            Some(TokenType::UserToken) => FfiTokenType::UserToken,
        }
    }
}

/// Outcome of an operation without a payload (e.g. login).
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
}

impl FfiResult {
    pub(crate) fn ok() -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
        }))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code: (&err).into(),
            error_message: to_c_string(err.to_string()),
            http_status: err.status().unwrap_or(0),
        }))
    }

    pub(crate) fn failure(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: to_c_string(msg),
            http_status: 0,
        }))
    }
}

/// The `meta.pagination` block. `present` is false when the body had none;
/// link strings are null when absent.
#[repr(C)]
pub struct FfiPagination {
    pub present: bool,
    pub total: u64,
    pub count: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub previous_link: *mut c_char,
    pub next_link: *mut c_char,
}

impl FfiPagination {
    fn absent() -> Self {
        FfiPagination {
            present: false,
            total: 0,
            count: 0,
            per_page: 0,
            current_page: 0,
            total_pages: 0,
            previous_link: std::ptr::null_mut(),
            next_link: std::ptr::null_mut(),
        }
    }

    fn from_core(p: Option<&Pagination>) -> Self {
        let Some(p) = p else {
            return Self::absent();
        };
        let link = |l: &Option<String>| match l {
            Some(url) => to_c_string(url.as_str()),
            None => std::ptr::null_mut(),
        };
        FfiPagination {
            present: true,
            total: p.total,
            count: p.count,
            per_page: p.per_page,
            current_page: p.current_page,
            total_pages: p.total_pages,
            previous_link: link(&p.links.previous),
            next_link: link(&p.links.next),
        }
    }
}

/// A parsed response envelope.
///
/// On success `error_code` is `Ok`; `data_json` and `response_json` hold
/// the `data` key and the whole decoded body as JSON text. On failure they
/// are null and `error_message` describes the problem.
#[repr(C)]
pub struct FfiEnvelope {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    /// `status_code` echoed in the body, `0` when unknown.
    pub status_code: u16,
    pub malformed: bool,
    pub data_json: *mut c_char,
    pub response_json: *mut c_char,
    pub pagination: FfiPagination,
}

impl FfiEnvelope {
    pub(crate) fn from_core(env: ResponseEnvelope) -> *mut Self {
        Box::into_raw(Box::new(FfiEnvelope {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: env.http_status().unwrap_or(0),
            status_code: env.status_code(),
            malformed: env.is_malformed(),
            data_json: to_c_string(env.data().to_string()),
            response_json: to_c_string(env.response().to_string()),
            pagination: FfiPagination::from_core(env.pagination()),
        }))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        Self::failure((&err).into(), &err.to_string(), err.status().unwrap_or(0))
    }

    pub(crate) fn failure(error_code: FfiErrorCode, msg: &str, http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiEnvelope {
            error_code,
            error_message: to_c_string(msg),
            http_status,
            status_code: 0,
            malformed: false,
            data_json: std::ptr::null_mut(),
            response_json: std::ptr::null_mut(),
            pagination: FfiPagination::absent(),
        }))
    }
}
