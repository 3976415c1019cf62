use serde::{Deserialize, Serialize};
use std::fmt;

/// A statically configured RPC endpoint.
///
/// Lower `priority` values are tried first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    pub priority: u32,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, priority: u32) -> Self {
        Self {
            url: url.into(),
            priority,
        }
    }

    /// Builds an endpoint list whose priorities follow iteration order.
    pub fn from_urls<I, S>(urls: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .enumerate()
            .map(|(i, url)| Self::new(url, i as u32))
            .collect()
    }
}

/// Why a single endpoint could not produce a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No answer within the per-endpoint timeout.
    Timeout,
    /// The transport handle could not be opened.
    Connect,
    /// The endpoint answered with an RPC or HTTP error.
    Rpc,
    /// The endpoint answered with something that did not decode.
    Malformed,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Rpc => "rpc",
            Self::Malformed => "malformed",
        };
        f.write_str(s)
    }
}

/// Diagnostic record of one failed endpoint attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointFailure {
    pub url: String,
    pub reason: FailureReason,
    pub detail: String,
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.url, self.reason, self.detail)
    }
}
