//! HTTP Digest access authentication (RFC 7616).

use md5::Md5;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors while interpreting a digest challenge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    #[error("Not a Digest challenge")]
    NotDigest,

    #[error("Challenge is missing '{0}'")]
    MissingParam(&'static str),

    #[error("Unsupported digest algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("Unsupported qop '{0}'")]
    UnsupportedQop(String),
}

/// Hash algorithm named by the challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Md5Sess,
    Sha256,
    Sha256Sess,
}

impl Algorithm {
    fn parse(value: &str) -> Result<Self, DigestError> {
        match value.to_ascii_uppercase().as_str() {
            "MD5" => Ok(Algorithm::Md5),
            "MD5-SESS" => Ok(Algorithm::Md5Sess),
            "SHA-256" => Ok(Algorithm::Sha256),
            "SHA-256-SESS" => Ok(Algorithm::Sha256Sess),
            _ => Err(DigestError::UnsupportedAlgorithm(value.to_string())),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Algorithm::Md5 => "MD5",
            Algorithm::Md5Sess => "MD5-sess",
            Algorithm::Sha256 => "SHA-256",
            Algorithm::Sha256Sess => "SHA-256-sess",
        }
    }

    fn is_session(self) -> bool {
        matches!(self, Algorithm::Md5Sess | Algorithm::Sha256Sess)
    }

    fn hash(self, data: &str) -> String {
        match self {
            Algorithm::Md5 | Algorithm::Md5Sess => hex::encode(Md5::digest(data.as_bytes())),
            Algorithm::Sha256 | Algorithm::Sha256Sess => hex::encode(Sha256::digest(data.as_bytes())),
        }
    }
}

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub algorithm: Algorithm,
    /// True when the server offered `qop=auth`; false for legacy RFC 2069 challenges.
    pub qop_auth: bool,
}

impl DigestChallenge {
    /// Parse one `WWW-Authenticate` header value.
    pub fn parse(header: &str) -> Result<Self, DigestError> {
        let header = header.trim_start();
        let (scheme, rest) = header.split_once(char::is_whitespace).unwrap_or((header, ""));
        if !scheme.eq_ignore_ascii_case("digest") {
            return Err(DigestError::NotDigest);
        }

        let mut realm = None;
        let mut nonce = None;
        let mut opaque = None;
        let mut algorithm = Algorithm::Md5;
        let mut qop = None;

        for (key, value) in parse_params(rest) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "opaque" => opaque = Some(value),
                "algorithm" => algorithm = Algorithm::parse(&value)?,
                "qop" => qop = Some(value),
                _ => {}
            }
        }

        let qop_auth = match qop {
            None => false,
            Some(offered) => {
                if offered.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")) {
                    true
                } else {
                    return Err(DigestError::UnsupportedQop(offered));
                }
            }
        };

        Ok(Self {
            realm: realm.ok_or(DigestError::MissingParam("realm"))?,
            nonce: nonce.ok_or(DigestError::MissingParam("nonce"))?,
            opaque,
            algorithm,
            qop_auth,
        })
    }

    /// Compute the `Authorization` header value answering this challenge.
    ///
    /// `uri` is the request target (path and query) exactly as sent.
    pub fn authorize(
        &self,
        username: &str,
        password: &str,
        method: &str,
        uri: &str,
        cnonce: &str,
        nonce_count: u32,
    ) -> String {
        let alg = self.algorithm;
        let nc = format!("{:08x}", nonce_count);

        let mut ha1 = alg.hash(&format!("{}:{}:{}", username, self.realm, password));
        if alg.is_session() {
            ha1 = alg.hash(&format!("{}:{}:{}", ha1, self.nonce, cnonce));
        }
        let ha2 = alg.hash(&format!("{}:{}", method, uri));

        let response = if self.qop_auth {
            alg.hash(&format!("{}:{}:{}:{}:auth:{}", ha1, self.nonce, nc, cnonce, ha2))
        } else {
            alg.hash(&format!("{}:{}:{}", ha1, self.nonce, ha2))
        };

        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\"",
            quote(username),
            quote(&self.realm),
            quote(&self.nonce),
            quote(uri),
            response
        );
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(", opaque=\"{}\"", quote(opaque)));
        }
        header.push_str(&format!(", algorithm={}", alg.as_str()));
        if self.qop_auth {
            header.push_str(&format!(", qop=auth, nc={}, cnonce=\"{}\"", nc, cnonce));
        }
        header
    }
}

/// Fresh client nonce for one authorization.
pub fn new_cnonce() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Split `k1="v, 1", k2=v2` into pairs, honouring quoted strings and escapes.
fn parse_params(input: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ',' {
                break;
            }
            key.push(c);
            chars.next();
        }
        if key.trim().is_empty() {
            break;
        }
        if chars.next() != Some('=') {
            continue;
        }
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
            value = value.trim().to_string();
        }
        params.push((key.trim().to_string(), value));
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_challenge() {
        let challenge = DigestChallenge::parse(
            r#"Digest realm="MMS Public API", domain="", nonce="abc,def", algorithm=MD5, qop="auth", stale=false"#,
        )
        .unwrap();
        assert_eq!(challenge.realm, "MMS Public API");
        assert_eq!(challenge.nonce, "abc,def");
        assert_eq!(challenge.algorithm, Algorithm::Md5);
        assert!(challenge.qop_auth);
        assert!(challenge.opaque.is_none());
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert_eq!(
            DigestChallenge::parse(r#"Bearer realm="x""#),
            Err(DigestError::NotDigest)
        );
        assert_eq!(
            DigestChallenge::parse(r#"Digest nonce="n""#),
            Err(DigestError::MissingParam("realm"))
        );
        assert_eq!(
            DigestChallenge::parse(r#"Digest realm="r", nonce="n", qop="auth-int""#),
            Err(DigestError::UnsupportedQop("auth-int".into()))
        );
    }

    #[test]
    fn test_rfc2617_example() {
        // Worked example from RFC 2617 section 3.5.
        let challenge = DigestChallenge::parse(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .unwrap();
        let header = challenge.authorize(
            "Mufasa",
            "Circle Of Life",
            "GET",
            "/dir/index.html",
            "0a4f113b",
            1,
        );
        assert!(header.starts_with("Digest username=\"Mufasa\""));
        assert!(header.contains("response=\"6629fae49393a05397450978507c4ef1\""));
        assert!(header.contains("nc=00000001"));
        assert!(header.contains("cnonce=\"0a4f113b\""));
        assert!(header.contains("opaque=\"5ccc069c403ebaf9f0171e9517f40e41\""));
    }

    #[test]
    fn test_legacy_challenge_without_qop() {
        let challenge = DigestChallenge::parse(r#"Digest realm="r", nonce="n""#).unwrap();
        let header = challenge.authorize("u", "p", "GET", "/", "c", 1);
        let ha1 = hex::encode(Md5::digest(b"u:r:p"));
        let ha2 = hex::encode(Md5::digest(b"GET:/"));
        let expected = hex::encode(Md5::digest(format!("{}:n:{}", ha1, ha2).as_bytes()));
        assert!(header.contains(&format!("response=\"{}\"", expected)));
        assert!(!header.contains("qop="));
    }

    #[test]
    fn test_sha256_session() {
        let challenge =
            DigestChallenge::parse(r#"Digest realm="r", nonce="n", algorithm=SHA-256-sess, qop=auth"#).unwrap();
        assert_eq!(challenge.algorithm, Algorithm::Sha256Sess);
        let header = challenge.authorize("u", "p", "POST", "/x", "c", 2);
        assert!(header.contains("algorithm=SHA-256-sess"));
        assert!(header.contains("nc=00000002"));
    }

    #[test]
    fn test_cnonce_is_random_hex() {
        let a = new_cnonce();
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, new_cnonce());
    }
}
