//! Transport contract and the default reqwest transport.
//!
//! The pipeline only needs [`Transport`]. Most transports are easier to write
//! as a [`TransportAdapter`], which splits the call into overridable steps and
//! gets `Transport` through a blanket implementation.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header::CONTENT_TYPE};
use std::time::{Duration, Instant};
use tracing::trace;

use crate::{Body, Context, HttpClientError, Request, Response, Result};

/// Leaf of the pipeline: performs the network call for a context and stores
/// the response on it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the call described by `ctx.req()` and set `ctx.res`.
    async fn execute(&self, ctx: &mut Context) -> Result<()>;
}

/// Transport split into steps that alternate HTTP libraries can override.
#[async_trait]
pub trait TransportAdapter: Send + Sync {
    /// Library-specific call options.
    type Options: Send;
    /// Library-specific response.
    type Native: Send;
    /// Library-specific failure.
    type NativeError: std::error::Error + Send + Sync + 'static;

    /// Derive call options (timeout, query, headers, body) from the request.
    fn to_options(&self, req: &Request) -> Result<Self::Options>;

    /// Perform the network call.
    async fn make_request(
        &self,
        req: &Request,
        options: Self::Options,
    ) -> std::result::Result<Self::Native, Self::NativeError>;

    /// Copy the native response into the context's response record.
    fn to_response(&self, ctx: &mut Context, native: Self::Native) -> Result<()>;

    /// Translate a failed call into a domain error naming the method and URL.
    fn to_error(&self, err: Self::NativeError, req: &Request) -> HttpClientError {
        HttpClientError::Transport {
            method: req.method().clone(),
            url: req.url_or_empty().to_string(),
            message: err.to_string(),
            status: None,
            source: Box::new(err),
        }
    }
}

#[async_trait]
impl<T: TransportAdapter> Transport for T {
    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        trace!(
            method = %ctx.req().method(),
            url = ctx.req().url_or_empty(),
            "Sending HTTP request"
        );

        let options = self.to_options(ctx.req())?;
        let native = match self.make_request(ctx.req(), options).await {
            Ok(native) => native,
            Err(err) => return Err(self.to_error(err, ctx.req())),
        };
        self.to_response(ctx, native)
    }
}

/// Call options for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct ReqwestOptions {
    /// Parsed request URL.
    pub url: url::Url,
    /// Timeout after which the call is aborted.
    pub timeout: Duration,
    /// Query parameters to append.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Encoded body.
    pub body: Option<Bytes>,
    /// Whether the body was serialized from a structured value.
    pub json: bool,
}

/// Response as read by [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct NativeResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Final URL.
    pub url: String,
    /// Full response body.
    pub body: Bytes,
    /// Time spent sending the request and reading the body.
    pub elapsed: Duration,
}

/// Transport backed by [`reqwest`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default reqwest client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport around a preconfigured reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get the underlying reqwest client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl TransportAdapter for ReqwestTransport {
    type Options = ReqwestOptions;
    type Native = NativeResponse;
    type NativeError = reqwest::Error;

    fn to_options(&self, req: &Request) -> Result<ReqwestOptions> {
        let raw = req.url().ok_or(HttpClientError::MissingUrl)?;
        let url = url::Url::parse(raw)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{raw}: {e}")))?;

        let mut headers = req.headers().clone();
        let mut body = None;
        let mut json = false;
        if let Some(payload) = req.body().filter(|b| !b.is_empty()) {
            json = payload.is_json();
            if json && !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            body = Some(payload.to_bytes()?);
        }

        Ok(ReqwestOptions {
            url,
            timeout: req.timeout(),
            query: req.query().to_vec(),
            headers,
            body,
            json,
        })
    }

    async fn make_request(
        &self,
        req: &Request,
        options: ReqwestOptions,
    ) -> std::result::Result<NativeResponse, reqwest::Error> {
        let mut builder = self
            .client
            .request(req.method().clone(), options.url)
            .timeout(options.timeout)
            .headers(options.headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = options.body {
            builder = builder.body(body);
        }

        let start = Instant::now();
        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response.bytes().await?;

        Ok(NativeResponse {
            status,
            headers,
            url,
            body,
            elapsed: start.elapsed(),
        })
    }

    fn to_response(&self, ctx: &mut Context, native: NativeResponse) -> Result<()> {
        let retries = ctx
            .take_res()
            .map(|mut previous| previous.take_retries())
            .unwrap_or_default();
        let body = if native.body.is_empty() {
            Body::Empty
        } else {
            Body::Bytes(native.body)
        };

        ctx.set_res(
            Response::new(native.status)
                .with_headers(native.headers)
                .with_body(body)
                .with_url(native.url)
                .with_elapsed(native.elapsed)
                .with_retries(retries),
        );
        Ok(())
    }

    fn to_error(&self, err: reqwest::Error, req: &Request) -> HttpClientError {
        HttpClientError::Transport {
            method: req.method().clone(),
            url: req.url_or_empty().to_string(),
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Retry;
    use http::Method;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(method: Method, url: impl Into<String>) -> Context {
        let mut ctx = Context::new();
        ctx.set_method(method).set_url(url);
        ctx
    }

    #[test]
    fn test_to_options() {
        let transport = ReqwestTransport::new();
        let mut ctx = context(Method::POST, "http://www.example.com/items");
        ctx.add_query("a", 1).set_body(json!({"foo": "bar"}));
        ctx.add_header("x-trace", "1").unwrap();

        let options = transport.to_options(ctx.req()).unwrap();
        assert_eq!(options.url.as_str(), "http://www.example.com/items");
        assert_eq!(options.timeout, Duration::from_millis(1000));
        assert_eq!(options.query, vec![("a".to_string(), "1".to_string())]);
        assert_eq!(options.headers.get("x-trace").unwrap(), "1");
        assert_eq!(options.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(options.json);
        assert_eq!(options.body.unwrap(), Bytes::from_static(br#"{"foo":"bar"}"#));
    }

    #[test]
    fn test_to_options_keeps_explicit_content_type_and_raw_body() {
        let transport = ReqwestTransport::new();
        let mut ctx = context(Method::PUT, "http://www.example.com/");
        ctx.set_body("plain");
        ctx.add_header("content-type", "text/plain").unwrap();

        let options = transport.to_options(ctx.req()).unwrap();
        assert!(!options.json);
        assert_eq!(options.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(options.body.unwrap(), Bytes::from_static(b"plain"));
    }

    #[test]
    fn test_to_options_rejects_missing_or_relative_url() {
        let transport = ReqwestTransport::new();
        assert!(matches!(
            transport.to_options(Context::new().req()),
            Err(HttpClientError::MissingUrl)
        ));
        assert!(matches!(
            transport.to_options(context(Method::GET, "/relative").req()),
            Err(HttpClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_to_response_preserves_retry_log() {
        let transport = ReqwestTransport::new();
        let mut ctx = context(Method::GET, "http://www.example.com/");
        let earlier = vec![Retry {
            reason: "boom".to_string(),
            status_code: Some(500),
        }];
        ctx.set_res(Response::new(StatusCode::INTERNAL_SERVER_ERROR).with_retries(earlier.clone()));

        transport
            .to_response(
                &mut ctx,
                NativeResponse {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    url: "http://www.example.com/".to_string(),
                    body: Bytes::from_static(b"ok"),
                    elapsed: Duration::from_millis(3),
                },
            )
            .unwrap();

        let res = ctx.res().unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().unwrap(), "ok");
        assert_eq!(res.elapsed(), Duration::from_millis(3));
        assert_eq!(res.retries(), earlier.as_slice());
    }

    #[tokio::test]
    async fn test_execute_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/items"))
            .and(query_param("page", "2"))
            .and(header("x-api-key", "secret"))
            .and(body_json(json!({"name": "widget"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("x-id", "42")
                    .set_body_string("created"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut ctx = context(Method::POST, format!("{}/items", server.uri()));
        ctx.add_query("page", 2).set_body(json!({"name": "widget"}));
        ctx.add_header("x-api-key", "secret").unwrap();

        ReqwestTransport::new().execute(&mut ctx).await.unwrap();

        let res = ctx.res().unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.header("x-id"), Some("42"));
        assert_eq!(res.text().unwrap(), "created");
        assert!(res.url().starts_with(&server.uri()));
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let url = format!("{}/slow", server.uri());
        let mut ctx = context(Method::GET, url.clone());
        ctx.set_timeout(Duration::from_millis(50));

        let err = ReqwestTransport::new().execute(&mut ctx).await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.is_timeout());
        assert!(err.to_string().starts_with(&format!("Request failed for GET {url}: ")));
        assert!(ctx.res().is_none());
    }

    #[tokio::test]
    async fn test_connection_failure_names_method_and_url() {
        let mut ctx = context(Method::DELETE, "http://127.0.0.1:9/gone");

        let err = ReqwestTransport::new().execute(&mut ctx).await.unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Request failed for DELETE http://127.0.0.1:9/gone: ")
        );
    }

    struct StaticAdapter;

    #[derive(Debug, thiserror::Error)]
    #[error("static failure")]
    struct StaticError;

    #[async_trait]
    impl TransportAdapter for StaticAdapter {
        type Options = bool;
        type Native = &'static str;
        type NativeError = StaticError;

        fn to_options(&self, req: &Request) -> Result<bool> {
            Ok(req.url() == Some("http://ok/"))
        }

        async fn make_request(
            &self,
            _req: &Request,
            ok: bool,
        ) -> std::result::Result<&'static str, StaticError> {
            if ok { Ok("static") } else { Err(StaticError) }
        }

        fn to_response(&self, ctx: &mut Context, native: &'static str) -> Result<()> {
            ctx.set_res(Response::new(StatusCode::OK).with_body(native));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_custom_adapter_uses_default_error_translation() {
        let mut ok = context(Method::GET, "http://ok/");
        StaticAdapter.execute(&mut ok).await.unwrap();
        assert_eq!(ok.res().unwrap().text().unwrap(), "static");

        let mut failing = context(Method::HEAD, "http://down/");
        let err = StaticAdapter.execute(&mut failing).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Request failed for HEAD http://down/: static failure"
        );
    }
}
