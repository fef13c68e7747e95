//! HTTP execution for the text API.
//!
//! Owns one `reqwest::Client`, injects the authentication and wrapper
//! headers, and turns every outcome into a [`W3wResult`]:
//!
//! - 2xx: decode the body into the requested DTO (decode failure is `Unknown`)
//! - non-2xx: decode `{"error":{..}}` and classify it
//! - transport failure: `Network`

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::dto::ErrorResponse;
use crate::config::ClientConfig;
use crate::error::{W3wError, W3wResult};

pub const API_KEY_HEADER: &str = "X-Api-Key";
pub const WRAPPER_HEADER: &str = "X-W3W-Wrapper";
pub const APP_PACKAGE_HEADER: &str = "X-Android-Package";
pub const APP_CERT_HEADER: &str = "X-Android-Cert";

/// Value of the wrapper header identifying this library to the server.
pub fn wrapper_user_agent() -> String {
    format!(
        "what3words-Rust/{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

pub struct HttpTextClient {
    http: Client,
    base: Url,
    headers: HeaderMap,
}

/// Parse the configured endpoint so that operation paths are joined under it:
/// `https://proxy/v3` and `https://proxy/v3/` both address `/v3/<operation>`.
fn endpoint_base(endpoint: &str) -> W3wResult<Url> {
    let mut base = Url::parse(endpoint).map_err(|e| {
        W3wError::unknown(format!("invalid text endpoint {:?}: {}", endpoint, e))
    })?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

impl HttpTextClient {
    pub fn new(config: &ClientConfig) -> W3wResult<Self> {
        let base = endpoint_base(&config.text_endpoint)?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| W3wError::unknown(format!("failed to build HTTP client: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        insert_header(&mut headers, API_KEY_HEADER, &config.api_key)?;
        insert_header(&mut headers, WRAPPER_HEADER, &wrapper_user_agent())?;
        if let Some(identity) = &config.app_identity {
            insert_header(&mut headers, APP_PACKAGE_HEADER, &identity.package_name)?;
            if let Some(digest) = &identity.certificate_digest {
                insert_header(&mut headers, APP_CERT_HEADER, digest)?;
            }
        }
        for (name, value) in &config.headers {
            insert_header(&mut headers, name, value)?;
        }

        Ok(Self {
            http,
            base,
            headers,
        })
    }

    /// GET `path` with `query`, decoding the success body as `T`.
    ///
    /// `extra_headers` override the configured ones for this request only.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        extra_headers: &HashMap<String, String>,
    ) -> W3wResult<T> {
        let body = self.execute(path, query, extra_headers).await?;
        serde_json::from_str::<T>(&body).map_err(|e| {
            log::error!("Failed to decode {} response: {}", path, e);
            W3wError::unknown(format!("failed to decode response: {}", e))
        })
    }

    /// GET whose success body carries nothing of interest.
    pub async fn get_discarding_body(
        &self,
        path: &str,
        query: &[(&str, String)],
        extra_headers: &HashMap<String, String>,
    ) -> W3wResult<()> {
        self.execute(path, query, extra_headers).await.map(|_| ())
    }

    /// Send the request and return the body of a 2xx response.
    async fn execute(
        &self,
        path: &str,
        query: &[(&str, String)],
        extra_headers: &HashMap<String, String>,
    ) -> W3wResult<String> {
        let url = self
            .base
            .join(path)
            .map_err(|e| W3wError::unknown(format!("invalid request path {:?}: {}", path, e)))?;

        let mut headers = self.headers.clone();
        for (name, value) in extra_headers {
            insert_header(&mut headers, name, value)?;
        }

        log::debug!("GET {} ({} query params)", url.path(), query.len());

        let response = self
            .http
            .get(url)
            .headers(headers)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                log::warn!("Text API transport failure on {}: {}", path, e);
                W3wError::network(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| W3wError::network(e.to_string()))?;

        if status.is_success() {
            return Ok(body);
        }

        let err = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(error_response) => error_response.to_domain(),
            Err(_) => W3wError::unknown(format!("HTTP {}: {}", status.as_u16(), body)),
        };
        log::error!("Text API error ({}) on {}: {}", status.as_u16(), path, err);
        Err(err)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> W3wResult<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| W3wError::unknown(format!("invalid header name {:?}: {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| W3wError::unknown(format!("invalid value for header {}: {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppIdentity;

    #[test]
    fn wrapper_user_agent_names_the_library() {
        assert!(wrapper_user_agent().starts_with("what3words-Rust/"));
    }

    #[test]
    fn configured_headers_are_installed() {
        let config = ClientConfig::new("KEY")
            .with_header("X-Custom", "yes")
            .with_app_identity(AppIdentity {
                package_name: "com.example.app".to_string(),
                certificate_digest: Some("AB:CD".to_string()),
            });
        let client = HttpTextClient::new(&config).unwrap();

        assert_eq!(client.headers[API_KEY_HEADER], "KEY");
        assert_eq!(client.headers[APP_PACKAGE_HEADER], "com.example.app");
        assert_eq!(client.headers[APP_CERT_HEADER], "AB:CD");
        assert_eq!(client.headers["X-Custom"], "yes");
        assert_eq!(client.headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn endpoint_path_is_kept_with_or_without_trailing_slash() {
        for endpoint in ["https://proxy.example.com/v3", "https://proxy.example.com/v3/"] {
            let base = endpoint_base(endpoint).unwrap();
            assert_eq!(
                base.join("autosuggest").unwrap().as_str(),
                "https://proxy.example.com/v3/autosuggest"
            );
        }
        let base = endpoint_base("http://localhost:8080").unwrap();
        assert_eq!(
            base.join("convert-to-3wa").unwrap().as_str(),
            "http://localhost:8080/convert-to-3wa"
        );
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let config = ClientConfig::new("KEY").with_text_endpoint("not a url");
        assert!(HttpTextClient::new(&config).is_err());
    }
}
