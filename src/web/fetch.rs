//! Page fetching
//!
//! Plain GET with scheme validation and a private-address guard: the
//! URLs fetched here come out of model replies, so loopback and RFC1918
//! targets are refused before any request is made.

use std::net::{IpAddr, ToSocketAddrs};
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::{Error, Result};

/// Fetches pages named in model replies
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Create a fetcher
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("sotto/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client })
    }

    /// Fetch a URL and return the response body as text
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebFetch`] on a non-http(s) scheme, a host that
    /// resolves to a private or loopback address, or a failed request
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let parsed =
            Url::parse(url).map_err(|e| Error::WebFetch(format!("invalid URL {url}: {e}")))?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(Error::WebFetch(format!("refusing non-http scheme: {scheme}")));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| Error::WebFetch(format!("URL has no host: {url}")))?;
        let port = parsed.port_or_known_default().unwrap_or(80);
        check_target(host, port)?;

        tracing::debug!(url, "fetching page");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| Error::WebFetch(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::WebFetch(format!("{url} answered {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::WebFetch(format!("unreadable body: {e}")))?;

        tracing::debug!(url, bytes = body.len(), "page fetched");
        Ok(body)
    }
}

/// Refuse hosts resolving to addresses the assistant has no business
/// talking to on the model's behalf
fn check_target(host: &str, port: u16) -> Result<()> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| Error::WebFetch(format!("cannot resolve {host}: {e}")))?;

    for addr in addrs {
        if is_internal(addr.ip()) {
            return Err(Error::WebFetch(format!(
                "{host} resolves to internal address {}",
                addr.ip()
            )));
        }
    }
    Ok(())
}

fn is_internal(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            let first = (v6.segments()[0] >> 8) as u8;
            v6.is_loopback()
                || v6.is_unspecified()
                || first == 0xfc
                || first == 0xfd
                || v6.segments()[0] & 0xffc0 == 0xfe80
        }
    }
}
