//! Per-call request context

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
};
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;
use crate::standards::ProviderFamily;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// How the credential is attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <credential>`
    Bearer,
    /// Credential in a vendor header (e.g. `x-api-key`, `x-goog-api-key`).
    Header(String),
    None,
}

impl AuthScheme {
    pub fn for_family(family: ProviderFamily) -> Self {
        match family {
            ProviderFamily::OpenAiChat | ProviderFamily::OpenAiResponses => AuthScheme::Bearer,
            ProviderFamily::Anthropic => AuthScheme::Header("x-api-key".to_string()),
            ProviderFamily::Gemini => AuthScheme::Header("x-goog-api-key".to_string()),
        }
    }
}

/// Everything one upstream call needs to address and authenticate itself.
///
/// Built per invocation and never mutated by the core; headers are applied to the
/// `RequestBuilder` of that one call only.
#[derive(Clone)]
pub struct RequestContext {
    family: ProviderFamily,
    base_url: String,
    credential: Option<SecretString>,
    auth: AuthScheme,
    extra_headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("family", &self.family)
            .field("base_url", &self.base_url)
            .field("credential_present", &self.credential.is_some())
            .field("auth", &self.auth)
            .field("extra_headers", &self.extra_headers.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RequestContext {
    pub fn new(family: ProviderFamily, base_url: impl Into<String>) -> Self {
        Self {
            family,
            base_url: base_url.into(),
            credential: None,
            auth: AuthScheme::for_family(family),
            extra_headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(SecretString::from(credential.into()));
        self
    }

    pub fn with_auth_scheme(mut self, auth: AuthScheme) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Per-request timeout (whole request, including the streamed body).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn family(&self) -> ProviderFamily {
        self.family
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join `path` onto the base URL. Absolute URLs are used as-is.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }

    /// Headers for this call: JSON content type, vendor auth, vendor version pins and
    /// caller extras (extras win).
    pub fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(credential) = &self.credential {
            let secret = credential.expose_secret();
            match &self.auth {
                AuthScheme::Bearer => {
                    headers.insert(AUTHORIZATION, header_value(&format!("Bearer {secret}"))?);
                }
                AuthScheme::Header(name) => {
                    headers.insert(header_name(name)?, header_value(secret)?);
                }
                AuthScheme::None => {}
            }
        }

        if self.family == ProviderFamily::Anthropic {
            headers.insert(
                HeaderName::from_static("anthropic-version"),
                HeaderValue::from_static(ANTHROPIC_VERSION),
            );
        }

        for (name, value) in &self.extra_headers {
            headers.insert(header_name(name)?, header_value(value)?);
        }
        Ok(headers)
    }

    /// Start a request for `path` on the shared client.
    pub fn build(
        &self,
        client: &Client,
        method: Method,
        path: &str,
    ) -> Result<RequestBuilder, LlmError> {
        let mut request = client.request(method, self.url(path)).headers(self.headers()?);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        Ok(request)
    }

    /// Like `build`, asking for an event stream.
    pub fn build_stream(
        &self,
        client: &Client,
        method: Method,
        path: &str,
    ) -> Result<RequestBuilder, LlmError> {
        Ok(self
            .build(client, method, path)?
            .header(ACCEPT, "text/event-stream"))
    }
}

fn header_name(name: &str) -> Result<HeaderName, LlmError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        LlmError::ConfigurationError(format!("Invalid header name '{name}': {e}"))
    })
}

fn header_value(value: &str) -> Result<HeaderValue, LlmError> {
    HeaderValue::from_str(value)
        .map_err(|e| LlmError::ConfigurationError(format!("Invalid header value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_auth_for_openai_families() {
        let ctx = RequestContext::new(ProviderFamily::OpenAiChat, "https://api.openai.com/v1/")
            .with_credential("sk-test");
        let headers = ctx.headers().expect("headers");
        assert_eq!(
            headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer sk-test")
        );
        assert_eq!(ctx.url("/chat/completions"), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn anthropic_uses_api_key_header_and_version_pin() {
        let ctx = RequestContext::new(ProviderFamily::Anthropic, "https://api.anthropic.com/v1")
            .with_credential("key");
        let headers = ctx.headers().expect("headers");
        assert_eq!(headers.get("x-api-key").and_then(|v| v.to_str().ok()), Some("key"));
        assert!(headers.contains_key("anthropic-version"));
        assert!(!headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn extra_headers_override_and_invalid_ones_fail() {
        let ctx = RequestContext::new(ProviderFamily::Gemini, "https://example.com")
            .with_credential("g")
            .with_header("x-goog-api-key", "override");
        let headers = ctx.headers().expect("headers");
        assert_eq!(
            headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()),
            Some("override")
        );

        let bad = RequestContext::new(ProviderFamily::Gemini, "https://example.com")
            .with_header("bad header", "v");
        assert!(matches!(bad.headers(), Err(LlmError::ConfigurationError(_))));
    }

    #[test]
    fn debug_does_not_leak_the_credential() {
        let ctx = RequestContext::new(ProviderFamily::OpenAiChat, "https://example.com")
            .with_credential("super-secret");
        let printed = format!("{ctx:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("credential_present: true"));
    }

    #[test]
    fn absolute_paths_bypass_the_base_url() {
        let ctx = RequestContext::new(ProviderFamily::OpenAiChat, "https://example.com/v1");
        assert_eq!(ctx.url("https://other.example/x"), "https://other.example/x");
        assert_eq!(ctx.url(""), "https://example.com/v1");
    }
}
