use std::{fmt, time::Duration};

use tracing::trace;
use ureq::{
    http::{HeaderMap, Response},
    Agent, Body, Proxy, RequestBuilder,
};

use crate::error::RestError;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub headers: Option<HeaderMap>,
    pub proxy: Option<Proxy>,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    /// Defaults to a `pagenote` user agent with no proxy, no extra headers and
    /// no timeout, so a request waits as long as the transport allows.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagenote_rest::http_client::ClientConfig;
    ///
    /// let cfg = ClientConfig::default();
    /// assert_eq!(cfg.user_agent.as_deref(), Some("pagenote"));
    /// assert!(cfg.timeout.is_none());
    /// ```
    fn default() -> Self {
        Self {
            user_agent: Some("pagenote".into()),
            proxy: None,
            headers: None,
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Builds a `ureq` agent from this config.
    ///
    /// Status codes are never turned into errors by the agent; the caller
    /// inspects [`HttpResponse::status`] itself.
    pub fn build(&self) -> Agent {
        let mut config = Agent::config_builder()
            .http_status_as_error(false)
            .proxy(self.proxy.clone())
            .timeout_global(self.timeout);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        config.build().into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A fully assembled request, ready to hand to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers,
            body: None,
        }
    }

    pub fn post(
        url: impl Into<String>,
        headers: Vec<(String, String)>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers,
            body: Some(body.into()),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns whatever the server answered.
///
/// A non-2xx status is a successful send. Only failures to complete the
/// exchange (connection, TLS, reading the body) are errors.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RestError>;
}

/// [`Transport`] backed by a blocking `ureq` agent.
pub struct UreqTransport {
    agent: Agent,
    headers: Option<HeaderMap>,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            agent: config.build(),
            headers: config.headers.clone(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RestError> {
        trace!("{} {}", request.method, request.url);

        let response = match request.method {
            Method::Get => {
                let req = self.agent.get(request.url.as_str());
                apply_headers(req, &self.headers, &request.headers).call()?
            }
            Method::Post => {
                let req = self.agent.post(request.url.as_str());
                apply_headers(req, &self.headers, &request.headers)
                    .send(request.body.as_deref().unwrap_or_default())?
            }
        };

        read_response(response)
    }
}

fn read_response(mut response: Response<Body>) -> Result<HttpResponse, RestError> {
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string()?;
    Ok(HttpResponse {
        status,
        body,
    })
}

/// Applies the configured global headers, then the request's own headers.
fn apply_headers<B>(
    mut req: RequestBuilder<B>,
    global: &Option<HeaderMap>,
    headers: &[(String, String)],
) -> RequestBuilder<B> {
    if let Some(global) = global {
        for (key, value) in global.iter() {
            req = req.header(key, value);
        }
    }
    for (key, value) in headers {
        req = req.header(key.as_str(), value.as_str());
    }
    req
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.user_agent, Some("pagenote".to_string()));
        assert!(config.proxy.is_none());
        assert!(config.headers.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_client_config_with_timeout_builds() {
        let config = ClientConfig {
            user_agent: Some("test-agent".to_string()),
            proxy: None,
            headers: None,
            timeout: Some(Duration::from_secs(30)),
        };
        let _ = UreqTransport::new(&config);
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(201, "[]").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(300, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[test]
    fn test_request_header_lookup_is_case_insensitive() {
        let req = HttpRequest::get(
            "https://x.test",
            vec![("Content-Type".into(), "application/json".into())],
        );
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("apikey"), None);
    }

    #[test]
    fn test_post_carries_body() {
        let req = HttpRequest::post("https://x.test", vec![], "[]");
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body.as_deref(), Some("[]"));
        assert_eq!(req.method.to_string(), "POST");
    }

    #[test]
    fn test_apply_headers() {
        let agent: Agent = Agent::config_builder().build().into();
        let mut global = HeaderMap::new();
        global.insert(
            ureq::http::header::USER_AGENT,
            ureq::http::HeaderValue::from_static("test-agent"),
        );
        let req = agent.get("https://example.com");
        let _ = apply_headers(req, &Some(global), &[("apikey".into(), "k".into())]);
    }
}
