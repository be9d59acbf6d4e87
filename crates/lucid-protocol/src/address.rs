//! Validated Lucid server addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ProtocolError, DEFAULT_SERVER_URI};

/// The base address of a Lucid server, e.g. `http://localhost:7090`.
///
/// Only `http`/`https` URLs with a host are accepted. Query strings,
/// fragments and trailing slashes are dropped, so two spellings of the
/// same server compare equal and paths can be appended without producing
/// `//`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerAddress(Url);

impl ServerAddress {
    /// Parses and normalizes an address.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidAddress`] when the input is not an absolute
    /// `http`/`https` URL with a host.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let trimmed = input.trim();
        let mut url = Url::parse(trimmed)
            .map_err(|e| ProtocolError::InvalidAddress(format!("{trimmed}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProtocolError::InvalidAddress(format!(
                "{trimmed}: scheme must be http or https"
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ProtocolError::InvalidAddress(format!(
                "{trimmed}: missing host"
            )));
        }

        url.set_query(None);
        url.set_fragment(None);
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&path);

        Ok(Self(url))
    }

    /// The normalized URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Appends path segments to the address.
    ///
    /// Each segment is percent-encoded on its own, `/` included, so a key
    /// like `a/b` stays a single segment (`a%2Fb`).
    ///
    /// # Errors
    /// [`ProtocolError::InvalidSegment`] for a `.` or `..` segment.
    pub fn join<I, S>(&self, segments: I) -> Result<Url, ProtocolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.0.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ProtocolError::InvalidAddress(self.to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                let segment = segment.as_ref();
                if matches!(segment, "." | "..") {
                    return Err(ProtocolError::InvalidSegment(segment.to_owned()));
                }
                path.push(segment);
            }
        }
        Ok(url)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A root path still renders as "/" in `Url`; hide it.
        let s = self.0.as_str();
        f.write_str(s.strip_suffix('/').unwrap_or(s))
    }
}

/// [`DEFAULT_SERVER_URI`], the address a local Lucid server listens on.
impl Default for ServerAddress {
    fn default() -> Self {
        // A fixed literal; `test_default_is_local_server` keeps it parseable.
        Self::parse(DEFAULT_SERVER_URI).expect("DEFAULT_SERVER_URI is a valid http address")
    }
}

impl FromStr for ServerAddress {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServerAddress {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ServerAddress> for String {
    fn from(value: ServerAddress) -> Self {
        value.to_string()
    }
}
