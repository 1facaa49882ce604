//! Target extraction and validation.
//!
//! # Responsibilities
//! - Pull the `url` parameter out of the query string or a urlencoded form
//! - Percent-decode it exactly once
//! - Parse it and check its host against the allowlist
//!
//! # Design Decisions
//! - Decoding happens here, on the raw encoded bytes, and nowhere else. The
//!   validator receives an already-decoded string and never decodes it again.
//! - Host comparison is case-insensitive: allowlist entries are lowercased on
//!   construction and `url` lowercases the hosts it parses.
//! - Exact membership only. `api.example.com` does not admit
//!   `evil.api.example.com` or `api.example.com.evil.net`.

use std::collections::HashSet;
use url::{form_urlencoded, Url};

use crate::error::ProxyError;

/// Name of the parameter carrying the destination URL.
pub const TARGET_PARAM: &str = "url";

/// Look up `name` in an `application/x-www-form-urlencoded` byte string and
/// return its percent-decoded value.
///
/// Query strings share this encoding, so the same routine serves both.
pub fn find_param(encoded: &[u8], name: &str) -> Option<String> {
    form_urlencoded::parse(encoded)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Extract the decoded target, preferring the query string over a form body.
pub fn extract_target(query: Option<&str>, form_body: Option<&[u8]>) -> Option<String> {
    query
        .and_then(|q| find_param(q.as_bytes(), TARGET_PARAM))
        .or_else(|| form_body.and_then(|body| find_param(body, TARGET_PARAM)))
}

/// The set of hostnames callers may reach.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    hosts: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Validates decoded target strings against an allowlist.
#[derive(Debug, Clone)]
pub struct TargetValidator {
    allowlist: AllowList,
}

impl TargetValidator {
    pub fn new(allowlist: AllowList) -> Self {
        Self { allowlist }
    }

    pub fn allowlist(&self) -> &AllowList {
        &self.allowlist
    }

    /// Turn an already-decoded target into a URL the proxy may call.
    pub fn validate(&self, target: Option<&str>) -> Result<Url, ProxyError> {
        let target = match target {
            Some(t) if !t.is_empty() => t,
            _ => return Err(ProxyError::MissingTarget),
        };

        let url = Url::parse(target).map_err(|e| ProxyError::InvalidTarget {
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::InvalidTarget {
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => {
                return Err(ProxyError::InvalidTarget {
                    reason: "missing host".to_string(),
                })
            }
        };

        if !self.allowlist.contains(host) {
            return Err(ProxyError::ForbiddenTarget {
                host: host.to_string(),
            });
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> TargetValidator {
        TargetValidator::new(AllowList::new(["pbx-panel.pishgaman.net", "MS-Pay.Aminh.pro"]))
    }

    #[test]
    fn test_missing_and_empty_target() {
        assert!(matches!(validator().validate(None), Err(ProxyError::MissingTarget)));
        assert!(matches!(validator().validate(Some("")), Err(ProxyError::MissingTarget)));
    }

    #[test]
    fn test_unparsable_or_hostless_target_is_invalid() {
        let v = validator();
        for target in ["not a url", "/relative/path", "mailto:ops@pbx-panel.pishgaman.net",
            "file:///etc/passwd", "ftp://pbx-panel.pishgaman.net/"]
        {
            assert!(
                matches!(v.validate(Some(target)), Err(ProxyError::InvalidTarget { .. })),
                "{target} should be invalid"
            );
        }
    }

    #[test]
    fn test_allowlist_is_exact_match() {
        let v = validator();
        for target in [
            "https://evil.pbx-panel.pishgaman.net/",
            "https://pbx-panel.pishgaman.net.evil.net/",
            "https://pishgaman.net/",
            "https://xpbx-panel.pishgaman.net/",
        ] {
            assert!(
                matches!(v.validate(Some(target)), Err(ProxyError::ForbiddenTarget { .. })),
                "{target} should be forbidden"
            );
        }
    }

    #[test]
    fn test_allowlist_is_case_insensitive() {
        let v = validator();
        assert!(v.validate(Some("https://PBX-PANEL.pishgaman.net/api")).is_ok());
        assert!(v.validate(Some("https://ms-pay.aminh.pro/pay")).is_ok());
    }

    #[test]
    fn test_userinfo_does_not_spoof_host() {
        let v = validator();
        let result = v.validate(Some("https://pbx-panel.pishgaman.net@evil.net/"));
        assert!(matches!(result, Err(ProxyError::ForbiddenTarget { host }) if host == "evil.net"));
    }

    #[test]
    fn test_validated_url_is_used_verbatim() {
        let url = validator()
            .validate(Some("https://pbx-panel.pishgaman.net:8443/v1/calls?from=1&to=2"))
            .unwrap();
        assert_eq!(url.as_str(), "https://pbx-panel.pishgaman.net:8443/v1/calls?from=1&to=2");
    }

    #[test]
    fn test_query_is_decoded_exactly_once() {
        let query = "url=https%3A%2F%2Fpbx-panel.pishgaman.net%2Fsearch%3Fq%3Da%2520b";
        let target = extract_target(Some(query), None).unwrap();
        assert_eq!(target, "https://pbx-panel.pishgaman.net/search?q=a%20b");

        let url = validator().validate(Some(&target)).unwrap();
        assert_eq!(url.query(), Some("q=a%20b"));
    }

    #[test]
    fn test_query_wins_over_form_body() {
        let target = extract_target(
            Some("url=https%3A%2F%2Fa.example"),
            Some(b"url=https%3A%2F%2Fb.example"),
        );
        assert_eq!(target.as_deref(), Some("https://a.example"));
    }

    #[test]
    fn test_form_body_used_when_query_lacks_target() {
        let target = extract_target(Some("other=1"), Some(b"name=x&url=https%3A%2F%2Fb.example%2F"));
        assert_eq!(target.as_deref(), Some("https://b.example/"));
        assert_eq!(extract_target(None, None), None);
    }
}
