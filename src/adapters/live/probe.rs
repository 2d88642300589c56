//! Live connectivity probe: URI validation plus a TCP reachability check.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::ports::probe::{ConnectivityProbe, ConnectivityResult, ProbeFailure};

const DEFAULT_PORT: u16 = 27017;

/// Probes a MongoDB deployment by opening a TCP connection to its first host.
pub struct LiveConnectivityProbe;

/// Host part of a parsed connection string.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    host: String,
    port: u16,
    /// Connection string with credentials removed.
    redacted: String,
}

fn parse_uri(uri: &str) -> Result<Target, ProbeFailure> {
    let rest = uri
        .strip_prefix("mongodb+srv://")
        .or_else(|| uri.strip_prefix("mongodb://"))
        .ok_or_else(|| {
            ProbeFailure::Validation("expected a mongodb:// or mongodb+srv:// scheme".into())
        })?;

    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    let hosts = authority.rsplit_once('@').map_or(authority, |(_, hosts)| hosts);
    let first = hosts.split(',').next().unwrap_or_default().trim();
    if first.is_empty() {
        return Err(ProbeFailure::Validation("no host in connection string".into()));
    }

    let (host, port) = match first.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| ProbeFailure::Validation(format!("invalid port `{port}`")))?;
            (host.to_string(), port)
        }
        None => (first.to_string(), DEFAULT_PORT),
    };

    Ok(Target { host, port, redacted: format!("{hosts}{}", &rest[authority_end..]) })
}

fn connect(target: &Target, timeout: Duration) -> Result<(), ProbeFailure> {
    let addrs = (target.host.as_str(), target.port)
        .to_socket_addrs()
        .map_err(|e| ProbeFailure::Unexpected(format!("cannot resolve {}: {e}", target.host)))?;

    let mut last = ProbeFailure::Unexpected(format!("no address for {}", target.host));
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => return Ok(()),
            Err(e) => {
                last = match e.kind() {
                    ErrorKind::TimedOut | ErrorKind::WouldBlock => ProbeFailure::Timeout,
                    ErrorKind::ConnectionRefused => ProbeFailure::Refused,
                    ErrorKind::PermissionDenied => ProbeFailure::Authentication(e.to_string()),
                    _ => ProbeFailure::Unexpected(e.to_string()),
                };
            }
        }
    }
    Err(last)
}

impl ConnectivityProbe for LiveConnectivityProbe {
    fn probe(&self, uri: &str, timeout: Duration) -> ConnectivityResult {
        let target = match parse_uri(uri) {
            Ok(t) => t,
            Err(failure) => return ConnectivityResult::failed(&failure),
        };

        tracing::debug!(host = %target.host, port = target.port, "probing document database");
        match connect(&target, timeout) {
            Ok(()) => {
                let mut details = BTreeMap::new();
                details.insert("connection".to_string(), target.redacted);
                ConnectivityResult::ok("Successfully reached the MongoDB server", details)
            }
            Err(failure) => {
                let mut result = ConnectivityResult::failed(&failure);
                result.details.insert("connection".to_string(), target.redacted);
                result
            }
        }
    }
}
