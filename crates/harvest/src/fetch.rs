// ABOUTME: HTTP transport for listing pages: GET with browser headers, size cap and charset decoding.
// ABOUTME: Any failure here is fatal for that one source and surfaces before extraction starts.

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::HarvestError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

const STAGE: &str = "Fetch";

/// Options for fetching a page.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
    /// Treat non-2xx responses as pages rather than errors.
    pub accept_non_success: bool,
}

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as UTF-8 text, using the charset from the content-type header if any.
    pub fn text_utf8(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Decode body bytes using the charset from content-type, or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract the charset value from a Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

fn request_error(source_name: &str, url: &str, e: reqwest::Error) -> HarvestError {
    if e.is_timeout() {
        HarvestError::timeout(
            source_name,
            STAGE,
            Some(anyhow::anyhow!("request to {} timed out", url)),
        )
    } else {
        HarvestError::fetch(
            source_name,
            STAGE,
            Some(anyhow::anyhow!("request to {} failed: {}", url, e)),
        )
    }
}

/// Fetch the page at `url` for the source `source_name`.
///
/// Timeouts and the User-Agent are configured on `client`.
pub async fn fetch(
    client: &reqwest::Client,
    source_name: &str,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, HarvestError> {
    let parsed_url = url::Url::parse(url).map_err(|e| {
        HarvestError::invalid_url(
            source_name,
            STAGE,
            Some(anyhow::anyhow!("`{}`: {}", url, e)),
        )
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(HarvestError::invalid_url(
            source_name,
            STAGE,
            Some(anyhow::anyhow!("scheme must be http or https, got `{}`", scheme)),
        ));
    }

    let mut request = client.get(parsed_url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    tracing::debug!(source = source_name, url, "fetching");
    let response = request
        .send()
        .await
        .map_err(|e| request_error(source_name, url, e))?;

    let content_length = response.content_length().or_else(|| {
        response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
    });
    if let Some(len) = content_length {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(HarvestError::fetch(
                source_name,
                STAGE,
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let status = response.status();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    if !status.is_success() && !opts.accept_non_success {
        return Err(HarvestError::fetch(
            source_name,
            STAGE,
            Some(anyhow::anyhow!("HTTP status {} from {}", status.as_u16(), url)),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| request_error(source_name, url, e))?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(HarvestError::fetch(
            source_name,
            STAGE,
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    tracing::debug!(source = source_name, status = status.as_u16(), bytes = body.len(), "fetched");

    Ok(FetchResult {
        status: status.as_u16(),
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}
