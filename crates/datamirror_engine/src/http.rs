//! HTTP implementations of the remote seams, built on a blocking agent.

use crate::config::SyncConfig;
use crate::error::{ListingError, RemoteError};
use crate::listing;
use crate::snapshot::ApiClient;
use crate::source::{RemoteFetcher, RemoteLister, RemoteSignatureProvider};
use bytes::Bytes;
use datamirror_types::{FileName, Signature};
use std::collections::BTreeSet;
use std::io::Read;
use std::time::Duration;

/// A remote source speaking plain HTTP against a directory-listing host.
///
/// - Listings are a `GET` of the listing page
/// - Signatures are a `HEAD` of the file, read from the `Content-Length`
///   and `Last-Modified` headers
/// - Fetches are a `GET` of the file
///
/// All requests carry the configured timeout and User-Agent. Names and
/// pages are joined to the base URL with a single slash at the seam, so
/// hosts that publish absolute paths (`/pub/...`) and relative ones both
/// resolve.
#[derive(Debug)]
pub struct HttpRemoteSource {
    agent: ureq::Agent,
    base_url: String,
    user_agent: String,
}

impl HttpRemoteSource {
    /// Creates a source for the given host, taking the timeout and
    /// User-Agent from the configuration.
    #[must_use]
    pub fn new(base_url: impl Into<String>, config: &SyncConfig) -> Self {
        Self {
            agent: build_agent(config.timeout),
            base_url: base_url.into(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn get(&self, path: &str) -> Result<ureq::Response, RemoteError> {
        self.agent
            .get(&join_url(&self.base_url, path))
            .set("User-Agent", &self.user_agent)
            .call()
            .map_err(classify)
    }
}

impl RemoteLister for HttpRemoteSource {
    fn list(&self, page: &str) -> Result<BTreeSet<FileName>, ListingError> {
        let response = self.get(page)?;
        let body = String::from_utf8(read_body(response)?)
            .map_err(|_| ListingError::Body("listing page is not valid UTF-8".to_string()))?;
        Ok(listing::file_names(&body))
    }
}

impl RemoteSignatureProvider for HttpRemoteSource {
    fn signature(&self, name: &FileName) -> Result<Signature, RemoteError> {
        let response = self
            .agent
            .head(&join_url(&self.base_url, name.as_str()))
            .set("User-Agent", &self.user_agent)
            .call()
            .map_err(classify)?;
        Ok(signature_from_headers(
            response.header("Content-Length"),
            response.header("Last-Modified"),
        ))
    }
}

impl RemoteFetcher for HttpRemoteSource {
    fn fetch(&self, name: &FileName) -> Result<Bytes, RemoteError> {
        let response = self.get(name.as_str())?;
        Ok(Bytes::from(read_body(response)?))
    }
}

/// An HTTP client for JSON APIs, used by snapshot jobs.
///
/// Unlike [`HttpRemoteSource`] it takes absolute URLs: API endpoints live
/// on their own hosts, not under the mirrored listing.
#[derive(Debug)]
pub struct HttpApiClient {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpApiClient {
    /// Creates a client, taking the timeout and User-Agent from the
    /// configuration.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            agent: build_agent(config.timeout),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl ApiClient for HttpApiClient {
    fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<String, RemoteError> {
        let mut request = self
            .agent
            .get(url)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/json");
        for (key, value) in query {
            request = request.query(key, value);
        }
        let response = request.call().map_err(classify)?;
        String::from_utf8(read_body(response)?).map_err(|_| RemoteError::Transport {
            message: "response body is not valid UTF-8".to_string(),
        })
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Splits the two halves of [`ureq::Error`]: a served non-success status
/// keeps its code, everything else is a transport failure.
fn classify(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, _) => RemoteError::Status { status },
        ureq::Error::Transport(transport) => RemoteError::Transport {
            message: transport.to_string(),
        },
    }
}

fn read_body(response: ureq::Response) -> Result<Vec<u8>, RemoteError> {
    let mut buffer = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut buffer)
        .map_err(|err| RemoteError::Transport {
            message: err.to_string(),
        })?;
    Ok(buffer)
}

/// Joins a base URL and a path with exactly one slash at the seam.
fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Builds a signature from response headers.
///
/// A missing or unparseable `Content-Length` reads as zero and a missing
/// `Last-Modified` as an empty marker, mirroring how the values behave on
/// the store side when nothing was recorded.
fn signature_from_headers(content_length: Option<&str>, last_modified: Option<&str>) -> Signature {
    let size = content_length
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0);
    Signature::new(size, last_modified.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_leaves_one_slash_at_the_seam() {
        assert_eq!(
            join_url("https://host.example", "/pub/pr.txt"),
            "https://host.example/pub/pr.txt"
        );
        assert_eq!(
            join_url("https://host.example/", "/pub/pr.txt"),
            "https://host.example/pub/pr.txt"
        );
        assert_eq!(
            join_url("https://host.example", "pr.txt"),
            "https://host.example/pr.txt"
        );
        assert_eq!(
            join_url("https://host.example/", "pr.txt"),
            "https://host.example/pr.txt"
        );
    }

    #[test]
    fn signature_reads_both_headers() {
        let sig = signature_from_headers(Some("1246257"), Some("Fri, 06 Feb 2026 13:30:00 GMT"));
        assert_eq!(
            sig,
            Signature::new(1_246_257, "Fri, 06 Feb 2026 13:30:00 GMT")
        );
    }

    #[test]
    fn missing_headers_default_to_zero_and_empty() {
        assert_eq!(signature_from_headers(None, None), Signature::new(0, ""));
    }

    #[test]
    fn unparseable_length_defaults_to_zero() {
        let sig = signature_from_headers(Some("not-a-number"), Some("m"));
        assert_eq!(sig, Signature::new(0, "m"));
    }
}
