//! Channel selection.

use simsweep_types::{RawOutput, RawTrace};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which part of the raw output to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSource {
    /// A trace or named scalar, by name.
    Name(String),
    /// A trace, by output port number.
    Port(u32),
}

/// A declared channel: its source and the name it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSelector {
    pub source: ChannelSource,
    /// Stored channel name; defaults to the source trace name.
    pub alias: Option<String>,
}

impl ChannelSelector {
    /// Select by trace or scalar name.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            source: ChannelSource::Name(name.into()),
            alias: None,
        }
    }

    /// Select by output port.
    pub fn port(port: u32) -> Self {
        Self {
            source: ChannelSource::Port(port),
            alias: None,
        }
    }

    /// Store the channel under a different name.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Find the selected trace in a raw output.
    pub fn find_trace<'a>(&self, raw: &'a RawOutput) -> Option<&'a RawTrace> {
        match &self.source {
            ChannelSource::Name(name) => raw.trace(name),
            ChannelSource::Port(port) => raw.trace_by_port(*port),
        }
    }

    /// Name the channel is stored under, given the trace it resolved to.
    pub fn channel_name<'a>(&'a self, trace_name: &'a str) -> &'a str {
        self.alias.as_deref().unwrap_or(trace_name)
    }
}

impl fmt::Display for ChannelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{}=", alias)?;
        }
        match &self.source {
            ChannelSource::Name(name) => f.write_str(name),
            ChannelSource::Port(port) => write!(f, "port:{}", port),
        }
    }
}

/// Error parsing a selector string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSelectorError {
    #[error("Empty channel selector")]
    Empty,

    #[error("Invalid port number in '{0}'")]
    InvalidPort(String),
}

/// Parses `name`, `port:N`, or either prefixed with `alias=`.
impl FromStr for ChannelSelector {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (alias, source) = match s.split_once('=') {
            Some((alias, source)) => (Some(alias.trim()), source.trim()),
            None => (None, s.trim()),
        };
        if source.is_empty() || alias == Some("") {
            return Err(ParseSelectorError::Empty);
        }
        let mut selector = match source.strip_prefix("port:") {
            Some(port) => ChannelSelector::port(
                port.trim()
                    .parse()
                    .map_err(|_| ParseSelectorError::InvalidPort(s.to_string()))?,
            ),
            None => ChannelSelector::name(source),
        };
        if let Some(alias) = alias {
            selector = selector.with_alias(alias);
        }
        Ok(selector)
    }
}
