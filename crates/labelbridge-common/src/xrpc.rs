//! # Stateless XRPC utilities and request/response mapping
//!
//! Mapping overview:
//! - Success (2xx): parse body into the endpoint's typed output.
//! - Anything else: surface `HttpError` with the status and raw body so
//!   callers can audit exactly what the server said.

use crate::error::{EncodeError, HttpError, TransportError, XrpcResult};
use crate::http_client::HttpClient;
use bytes::Bytes;
use http::{
    HeaderName, HeaderValue, Request,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

/// XRPC method type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XrpcMethod {
    /// Query (HTTP GET)
    Query,
    /// Procedure (HTTP POST) with the given body encoding
    Procedure(&'static str),
}

impl XrpcMethod {
    /// Get the HTTP method string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "GET",
            Self::Procedure(_) => "POST",
        }
    }

    /// Get the body encoding type for this method (procedures only)
    pub const fn body_encoding(&self) -> Option<&'static str> {
        match self {
            Self::Query => None,
            Self::Procedure(enc) => Some(enc),
        }
    }
}

/// Trait for XRPC request types (queries and procedures).
///
/// Implemented on the request parameters/input type itself. Queries
/// serialize to the URL query string; procedures serialize to a JSON body.
pub trait XrpcRequest: Serialize {
    /// The NSID for this XRPC method
    const NSID: &'static str;

    /// XRPC method (query/GET or procedure/POST)
    const METHOD: XrpcMethod;

    /// Output type decoded from a successful response body
    type Output: DeserializeOwned;

    /// Encode the request body for procedures.
    ///
    /// Default implementation serializes to JSON. Override for non-JSON encodings.
    fn encode_body(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Extension for stateless XRPC calls on any [`HttpClient`].
pub trait XrpcExt: HttpClient {
    /// Start building an XRPC call for the given base URL.
    fn xrpc(&self, base: Url) -> XrpcCall<'_, Self>
    where
        Self: Sized,
    {
        XrpcCall {
            client: self,
            base,
            bearer: None,
            extra_headers: Vec::new(),
        }
    }
}

impl<T: HttpClient> XrpcExt for T {}

/// Stateless XRPC call builder.
pub struct XrpcCall<'a, C: HttpClient> {
    client: &'a C,
    base: Url,
    bearer: Option<String>,
    extra_headers: Vec<(HeaderName, HeaderValue)>,
}

impl<'a, C: HttpClient> XrpcCall<'a, C> {
    /// Apply a bearer Authorization token to this call.
    pub fn auth_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Add an extra header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.extra_headers.push((name, value));
        self
    }

    /// Send the given typed XRPC request and decode the response.
    pub async fn send<R>(self, request: &R) -> XrpcResult<R::Output>
    where
        R: XrpcRequest,
    {
        let http_request = build_http_request(
            &self.base,
            request,
            self.bearer.as_deref(),
            &self.extra_headers,
        )?;

        let http_response = self
            .client
            .send_http(http_request)
            .await
            .map_err(|e| TransportError::Other(Box::new(e)))?;

        process_response::<R>(http_response)
    }
}

/// Build an HTTP request for an XRPC call given base URL and options
pub fn build_http_request<R>(
    base: &Url,
    req: &R,
    bearer: Option<&str>,
    extra_headers: &[(HeaderName, HeaderValue)],
) -> Result<Request<Vec<u8>>, crate::error::ClientError>
where
    R: XrpcRequest,
{
    let mut url = base.clone();
    let mut path = url.path().trim_end_matches('/').to_owned();
    path.push_str("/xrpc/");
    path.push_str(R::NSID);
    url.set_path(&path);

    if let XrpcMethod::Query = R::METHOD {
        let qs = serde_html_form::to_string(req).map_err(EncodeError::Query)?;
        if !qs.is_empty() {
            url.set_query(Some(&qs));
        } else {
            url.set_query(None);
        }
    }

    let method = match R::METHOD {
        XrpcMethod::Query => http::Method::GET,
        XrpcMethod::Procedure(_) => http::Method::POST,
    };

    let mut builder = Request::builder().method(method).uri(url.as_str());

    if let XrpcMethod::Procedure(encoding) = R::METHOD {
        builder = builder.header(CONTENT_TYPE, encoding);
    }
    builder = builder.header(ACCEPT, "application/json");

    if let Some(token) = bearer {
        let hv = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            TransportError::InvalidRequest(format!("Invalid authorization token: {}", e))
        })?;
        builder = builder.header(AUTHORIZATION, hv);
    }
    for (name, value) in extra_headers {
        builder = builder.header(name, value);
    }

    let body = if let XrpcMethod::Procedure(_) = R::METHOD {
        req.encode_body()?
    } else {
        vec![]
    };

    builder
        .body(body)
        .map_err(|e| TransportError::InvalidRequest(e.to_string()).into())
}

/// Process the HTTP response from the server into the endpoint's typed output.
pub fn process_response<R>(http_response: http::Response<Vec<u8>>) -> XrpcResult<R::Output>
where
    R: XrpcRequest,
{
    let status = http_response.status();
    let buffer = Bytes::from(http_response.into_body());

    if !status.is_success() {
        return Err(HttpError {
            status,
            body: Some(buffer),
        }
        .into());
    }

    let output = serde_json::from_slice(&buffer).map_err(crate::error::DecodeError::Json)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ListReq {
        #[serde(skip_serializing_if = "Option::is_none")]
        cursor: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        types: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct ListOut {
        items: Vec<String>,
    }

    impl XrpcRequest for ListReq {
        const NSID: &'static str = "com.example.list";
        const METHOD: XrpcMethod = XrpcMethod::Query;
        type Output = ListOut;
    }

    #[test]
    fn no_double_slash_in_path() {
        for base in [
            Url::parse("https://labeler").unwrap(),
            Url::parse("https://labeler/").unwrap(),
            Url::parse("https://labeler/base/").unwrap(),
        ] {
            let req = build_http_request(
                &base,
                &ListReq {
                    cursor: None,
                    types: None,
                },
                None,
                &[],
            )
            .unwrap();
            let uri = req.uri().to_string();
            assert!(uri.contains("/xrpc/com.example.list"));
            assert!(!uri.contains("//xrpc"));
        }
    }

    #[test]
    fn repeated_query_params_serialize_per_value() {
        let base = Url::parse("https://labeler").unwrap();
        let req = build_http_request(
            &base,
            &ListReq {
                cursor: Some("42".into()),
                types: Some(vec!["a".into(), "b".into()]),
            },
            None,
            &[],
        )
        .unwrap();
        let uri = req.uri().to_string();
        assert!(uri.contains("cursor=42"));
        assert!(uri.contains("types=a"));
        assert!(uri.contains("types=b"));
    }

    #[test]
    fn bearer_header_applied() {
        let base = Url::parse("https://labeler").unwrap();
        let req = build_http_request(
            &base,
            &ListReq {
                cursor: None,
                types: None,
            },
            Some("tok"),
            &[],
        )
        .unwrap();
        assert_eq!(
            req.headers().get(http::header::AUTHORIZATION).unwrap(),
            "Bearer tok"
        );
    }

    #[test]
    fn non_success_maps_to_http_error() {
        let resp = http::Response::builder()
            .status(500)
            .body(b"{\"error\":\"InternalServerError\"}".to_vec())
            .unwrap();
        match process_response::<ListReq>(resp).unwrap_err() {
            ClientError::Http(e) => {
                assert_eq!(e.status.as_u16(), 500);
                assert!(e.to_string().contains("500"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn success_decodes_output() {
        let resp = http::Response::builder()
            .status(200)
            .body(b"{\"items\":[\"x\"]}".to_vec())
            .unwrap();
        let out = process_response::<ListReq>(resp).unwrap();
        assert_eq!(out.items, vec!["x"]);
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        let resp = http::Response::builder()
            .status(200)
            .body(b"not json".to_vec())
            .unwrap();
        assert!(matches!(
            process_response::<ListReq>(resp).unwrap_err(),
            ClientError::Decode(_)
        ));
    }
}
