//! HTTP authentication challenges (RFC 7617 Basic, RFC 2617 Digest).
//!
//! Cameras typically answer an unauthenticated ONVIF request with `401` and
//! one or more `WWW-Authenticate` challenges. [`Challenge::select`] picks the
//! strongest one offered and [`Challenge::authorization`] produces the
//! matching `Authorization` header value.

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// A parsed `WWW-Authenticate` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic,
    Digest(DigestChallenge),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    /// Whether the server offered `qop="auth"`.
    pub qop_auth: bool,
    pub algorithm: Option<String>,
}

/// Client-side inputs for one authorization attempt.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl Challenge {
    /// Parse a single challenge header value.
    ///
    /// Returns `None` for unsupported schemes and for Digest challenges
    /// without a nonce or with an algorithm other than MD5.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (scheme, params) = value.split_once(' ').unwrap_or((value, ""));

        if scheme.eq_ignore_ascii_case("Basic") {
            return Some(Challenge::Basic);
        }
        if !scheme.eq_ignore_ascii_case("Digest") {
            return None;
        }

        let params = parse_params(params);
        let nonce = params.get("nonce")?.clone();
        let algorithm = params.get("algorithm").cloned();
        if let Some(alg) = &algorithm
            && !alg.eq_ignore_ascii_case("MD5")
        {
            tracing::debug!(algorithm = %alg, "unsupported digest algorithm");
            return None;
        }

        Some(Challenge::Digest(DigestChallenge {
            realm: params.get("realm").cloned().unwrap_or_default(),
            nonce,
            opaque: params.get("opaque").cloned(),
            qop_auth: params
                .get("qop")
                .is_some_and(|qop| qop.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth"))),
            algorithm,
        }))
    }

    /// Pick the preferred challenge among several header values.
    /// Digest wins over Basic.
    pub fn select<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut basic = None;
        for value in values {
            match Self::parse(value) {
                Some(digest @ Challenge::Digest(_)) => return Some(digest),
                Some(Challenge::Basic) => basic = Some(Challenge::Basic),
                None => {}
            }
        }
        basic
    }

    /// Build the `Authorization` header value answering this challenge.
    ///
    /// `cnonce` is only used for Digest with `qop=auth`.
    pub fn authorization(
        &self,
        credentials: Credentials<'_>,
        method: &str,
        uri: &str,
        cnonce: &str,
    ) -> String {
        match self {
            Challenge::Basic => {
                let token = BASE64.encode(format!("{}:{}", credentials.username, credentials.password));
                format!("Basic {token}")
            }
            Challenge::Digest(digest) => digest.authorization(credentials, method, uri, cnonce),
        }
    }
}

/// Nonce count; each challenge is answered exactly once.
const NONCE_COUNT: &str = "00000001";

impl DigestChallenge {
    fn authorization(&self, credentials: Credentials<'_>, method: &str, uri: &str, cnonce: &str) -> String {
        let ha1 = md5_hex(&format!("{}:{}:{}", credentials.username, self.realm, credentials.password));
        let ha2 = md5_hex(&format!("{method}:{uri}"));

        let response = if self.qop_auth {
            md5_hex(&format!("{ha1}:{}:{NONCE_COUNT}:{cnonce}:auth:{ha2}", self.nonce))
        } else {
            md5_hex(&format!("{ha1}:{}:{ha2}", self.nonce))
        };

        let mut header = format!(
            r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}""#,
            credentials.username, self.realm, self.nonce, uri, response
        );
        if let Some(algorithm) = &self.algorithm {
            header.push_str(&format!(", algorithm={algorithm}"));
        }
        if self.qop_auth {
            header.push_str(&format!(r#", qop=auth, nc={NONCE_COUNT}, cnonce="{cnonce}""#));
        }
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(r#", opaque="{opaque}""#));
        }
        header
    }
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input))
}

/// Split `key=value, key="quoted, value"` pairs. Quoted values may contain
/// commas.
fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else {
            break;
        };
        let key = rest[..eq].trim().trim_start_matches(',').trim().to_ascii_lowercase();
        rest = rest[eq + 1..].trim_start();

        let value;
        if let Some(quoted) = rest.strip_prefix('"') {
            let end = quoted.find('"').unwrap_or(quoted.len());
            value = quoted[..end].to_string();
            rest = quoted.get(end + 1..).unwrap_or_default();
        } else {
            let end = rest.find(',').unwrap_or(rest.len());
            value = rest[..end].trim().to_string();
            rest = &rest[end..];
        }
        rest = rest.trim_start().trim_start_matches(',').trim_start();

        params.insert(key, value);
    }

    params
}

/// Path-and-query of an absolute URL, as Digest's `uri` parameter wants it.
pub fn request_uri(url: &str) -> &str {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    match after_scheme.find('/') {
        Some(pos) => &after_scheme[pos..],
        None => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREDS: Credentials<'static> = Credentials {
        username: "Mufasa",
        password: "Circle Of Life",
    };

    #[test]
    fn parses_basic() {
        assert_eq!(Challenge::parse(r#"Basic realm="cam""#), Some(Challenge::Basic));
    }

    #[test]
    fn parses_digest_with_quoted_commas() {
        let challenge = Challenge::parse(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .unwrap();
        let Challenge::Digest(d) = challenge else {
            panic!("expected digest");
        };
        assert_eq!(d.realm, "testrealm@host.com");
        assert_eq!(d.nonce, "dcd98b7102dd2f0e8b11d0f600bfb0c093");
        assert_eq!(d.opaque.as_deref(), Some("5ccc069c403ebaf9f0171e9517f40e41"));
        assert!(d.qop_auth);
    }

    #[test]
    fn rejects_unknown_schemes_and_algorithms() {
        assert_eq!(Challenge::parse("Bearer realm=x"), None);
        assert_eq!(Challenge::parse(r#"Digest realm="r", nonce="n", algorithm=SHA-256"#), None);
        assert_eq!(Challenge::parse(r#"Digest realm="r""#), None);
    }

    #[test]
    fn digest_is_preferred() {
        let picked = Challenge::select([r#"Basic realm="cam""#, r#"Digest realm="cam", nonce="abc""#]);
        assert!(matches!(picked, Some(Challenge::Digest(_))));
        assert_eq!(Challenge::select([r#"Basic realm="cam""#]), Some(Challenge::Basic));
        assert_eq!(Challenge::select(["NTLM"]), None);
    }

    #[test]
    fn basic_authorization() {
        let header = Challenge::Basic.authorization(
            Credentials { username: "admin", password: "secret" },
            "POST",
            "/onvif/ptz_service",
            "",
        );
        assert_eq!(header, "Basic YWRtaW46c2VjcmV0");
    }

    #[test]
    fn digest_matches_rfc2617_example() {
        let challenge = Challenge::parse(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .unwrap();
        let header = challenge.authorization(CREDS, "GET", "/dir/index.html", "0a4f113b");
        assert!(header.contains(r#"response="6629fae49393a05397450978507c4ef1""#));
        assert!(header.contains("qop=auth, nc=00000001"));
        assert!(header.contains(r#"opaque="5ccc069c403ebaf9f0171e9517f40e41""#));
    }

    #[test]
    fn legacy_digest_without_qop() {
        let challenge = Challenge::parse(r#"Digest realm="r", nonce="n""#).unwrap();
        let header = challenge.authorization(
            Credentials { username: "u", password: "p" },
            "POST",
            "/onvif",
            "ignored",
        );
        let ha1 = md5_hex("u:r:p");
        let ha2 = md5_hex("POST:/onvif");
        let expected = md5_hex(&format!("{ha1}:n:{ha2}"));
        assert!(header.contains(&format!(r#"response="{expected}""#)));
        assert!(!header.contains("qop"));
    }

    #[test]
    fn extracts_request_uri() {
        assert_eq!(request_uri("http://cam:80/onvif/ptz_service"), "/onvif/ptz_service");
        assert_eq!(request_uri("http://cam"), "/");
        assert_eq!(request_uri("http://cam/a?b=c"), "/a?b=c");
    }
}
