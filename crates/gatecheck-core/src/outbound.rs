//! SSRF guard for URLs the server fetches on a caller's behalf.
//!
//! Checks run in a fixed order: parse, scheme, internal address, allow-list.
//! IP literals in reserved ranges are refused even if someone allow-lists
//! them; DNS is not resolved here, so name-based allow-listing is the
//! primary control.

use std::collections::HashSet;
use std::net::IpAddr;

use ipnet::IpNet;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::{ConfigError, Rejection, ValidationResult};
use crate::redirect::normalize_host;

static BLOCKED_NETS: Lazy<Vec<IpNet>> = Lazy::new(|| {
    [
        "0.0.0.0/8",
        "10.0.0.0/8",
        "100.64.0.0/10",
        "127.0.0.0/8",
        "169.254.0.0/16",
        "172.16.0.0/12",
        "192.0.0.0/24",
        "192.168.0.0/16",
        "198.18.0.0/15",
        "224.0.0.0/4",
        "240.0.0.0/4",
        "::/128",
        "::1/128",
        "fc00::/7",
        "fe80::/10",
        "ff00::/8",
    ]
    .iter()
    .filter_map(|n| n.parse().ok())
    .collect()
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboundOptions {
    /// Permit plain http in addition to https.
    pub allow_http: bool,
}

#[derive(Debug, Clone)]
pub struct OutboundUrlGuard {
    allowed_hosts: HashSet<String>,
    options: OutboundOptions,
}

impl OutboundUrlGuard {
    pub fn new<S: AsRef<str>>(
        allowed_hosts: impl IntoIterator<Item = S>,
        options: OutboundOptions,
    ) -> Result<Self, ConfigError> {
        let allowed_hosts = allowed_hosts
            .into_iter()
            .map(|h| normalize_host(h.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            allowed_hosts,
            options,
        })
    }

    pub fn validate(&self, raw: &str) -> ValidationResult<Url> {
        self.check(raw).map_err(|r| {
            tracing::debug!(guard = "outbound", reason = r.code(), "rejected");
            r
        })
    }

    fn check(&self, raw: &str) -> ValidationResult<Url> {
        let url = Url::parse(raw).map_err(|_| Rejection::InvalidUrl)?;
        let host = url.host().ok_or(Rejection::InvalidUrl)?;

        match url.scheme() {
            "https" => {}
            "http" if self.options.allow_http => {}
            _ => return Err(Rejection::InsecureScheme),
        }

        if is_internal_host(&host) {
            return Err(Rejection::InternalAddress);
        }

        let name = host.to_string();
        if !self.allowed_hosts.contains(&name) {
            return Err(Rejection::HostNotAllowed);
        }
        Ok(url)
    }
}

fn is_internal_host(host: &Host<&str>) -> bool {
    match host {
        Host::Ipv4(v4) => is_internal_ip(IpAddr::V4(*v4)),
        Host::Ipv6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_internal_ip(IpAddr::V4(v4)),
            None => is_internal_ip(IpAddr::V6(*v6)),
        },
        Host::Domain(d) => {
            let d = d.trim_end_matches('.');
            d == "localhost" || d.ends_with(".localhost") || d.ends_with(".internal")
        }
    }
}

pub fn is_internal_ip(ip: IpAddr) -> bool {
    BLOCKED_NETS.iter().any(|net| net.contains(&ip))
}
