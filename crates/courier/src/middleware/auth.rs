use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use courier_core::header::{HeaderName, AUTHORIZATION};
use courier_core::{
    BoxFuture, ErrorKind, Flow, HeaderValue, HttpError, Middleware, Request, RequestContext,
};
use std::fmt;

/// Credentials attached to every request.
#[derive(Clone)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Authorization: Basic base64(<username>:<password>)`
    Basic { username: String, password: String },
    /// An arbitrary header carrying an API key, such as `X-API-Key`.
    ApiKey { header: String, key: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::ApiKey { header, .. } => f
                .debug_struct("ApiKey")
                .field("header", header)
                .finish_non_exhaustive(),
        }
    }
}

/// Adds credentials to outbound requests.
///
/// The header value is computed once, when the middleware is created, and
/// marked sensitive so it is left out of `Debug` output. Requests that
/// already carry the header keep their own value.
#[derive(Clone)]
pub struct AuthMiddleware {
    header: HeaderName,
    value: HeaderValue,
}

impl AuthMiddleware {
    /// Fails with an [`Auth`](ErrorKind::Auth) error if the credentials cannot
    /// be expressed as a header.
    pub fn new(credentials: Credentials) -> Result<Self, HttpError> {
        let (header, raw) = match credentials {
            Credentials::Bearer(token) => (AUTHORIZATION, format!("Bearer {}", token)),
            Credentials::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{}:{}", username, password));
                (AUTHORIZATION, format!("Basic {}", encoded))
            }
            Credentials::ApiKey { header, key } => {
                let header = HeaderName::from_bytes(header.as_bytes()).map_err(|err| {
                    HttpError::new(ErrorKind::Auth, format!("invalid api key header {:?}", header))
                        .with_source(err)
                })?;
                (header, key)
            }
        };

        let mut value = HeaderValue::from_str(&raw).map_err(|err| {
            HttpError::new(ErrorKind::Auth, "credentials are not a valid header value")
                .with_source(err)
        })?;
        value.set_sensitive(true);

        Ok(Self { header, value })
    }

    pub fn bearer(token: impl Into<String>) -> Result<Self, HttpError> {
        Self::new(Credentials::Bearer(token.into()))
    }

    pub fn basic(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, HttpError> {
        Self::new(Credentials::Basic {
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn api_key(header: impl Into<String>, key: impl Into<String>) -> Result<Self, HttpError> {
        Self::new(Credentials::ApiKey {
            header: header.into(),
            key: key.into(),
        })
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header
    }
}

impl Middleware for AuthMiddleware {
    fn name(&self) -> &str {
        "auth"
    }

    fn before_request<'a>(
        &'a self,
        request: &'a mut Request,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Flow, HttpError>> {
        Box::pin(async move {
            let headers = request.headers_mut();
            if !headers.contains_key(&self.header) {
                headers.insert(self.header.clone(), self.value.clone());
            }
            Ok(Flow::Continue)
        })
    }
}

impl fmt::Debug for AuthMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthMiddleware")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}
