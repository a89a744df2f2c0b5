//! The Token Signer: RS256 JWT issuance/verification and JWK publication.
//!
//! Grounded on the teacher's `JwtKeyConfig`/`JwkKeySet` (RSA-only slice):
//! the same `jsonwebtoken` + `rsa` pairing is used to sign with a private
//! key, verify with the matching public key, and publish a JWK whose `kid`
//! is the RFC 7638 thumbprint of the key unless one is configured.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::jwk::{
    AlgorithmParameters, CommonParameters, Jwk, KeyAlgorithm, PublicKeyUse, RSAKeyParameters,
    RSAKeyType,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::sha2::{Digest, Sha256};
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde_json::json;
use uuid::Uuid;

use crate::model::{JwtClaims, TokenKind};

/// Failure modes of [`TokenSigner::verify`], matching §4.1 exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid_signature")]
    InvalidSignature,
    #[error("expired")]
    Expired,
    #[error("malformed")]
    Malformed,
    #[error("wrong_audience")]
    WrongAudience,
    #[error("wrong_issuer")]
    WrongIssuer,
}

/// Parameters needed to sign a fresh token; everything else (`iat`, `jti`)
/// is derived by the signer itself.
pub struct ClaimsToSign<'a> {
    pub sub: &'a str,
    pub aud: &'a str,
    pub scope: &'a str,
    pub token_type: TokenKind,
    pub client_id: &'a str,
    pub validity: Duration,
}

/// Signs and verifies RS256 JWTs and publishes the corresponding JWK set.
///
/// The private key never leaves this struct; it is read-only after
/// construction (§5 — "the Token Signer's private key is read-only after
/// startup").
pub struct TokenSigner {
    issuer: String,
    kid: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    public_key: RsaPublicKey,
    clock_skew: Duration,
}

impl TokenSigner {
    /// Build a signer from PEM-encoded RSA key material.
    ///
    /// `kid` defaults to the RFC 7638 thumbprint of the public key if not
    /// supplied.
    pub fn new(
        issuer: impl Into<String>,
        private_key_pem: &[u8],
        public_key_pem: &[u8],
        kid: Option<String>,
        clock_skew: Duration,
    ) -> Result<Self, anyhow::Error> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem)?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem)?;
        let public_key = parse_public_key(public_key_pem)?;
        let kid = match kid {
            Some(kid) => kid,
            None => jwk_thumbprint(&public_key)?,
        };

        Ok(Self {
            issuer: issuer.into(),
            kid,
            encoding_key,
            decoding_key,
            public_key,
            clock_skew,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Sign a fresh JWT. Rejects empty `sub`/`aud`/scope-less construction
    /// is caught at the type level: every field of [`ClaimsToSign`] is
    /// required, so a missing required claim is a compile error for callers
    /// within this crate, matching the "rejects signing requests with
    /// missing required claims" contract at the API boundary.
    pub fn sign(&self, claims: ClaimsToSign<'_>) -> Result<(String, JwtClaims), jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + claims.validity;
        let full_claims = JwtClaims {
            iss: self.issuer.clone(),
            sub: claims.sub.to_string(),
            aud: claims.aud.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            scope: claims.scope.to_string(),
            token_type: claims.token_type,
            client_id: claims.client_id.to_string(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        let compact = encode(&header, &full_claims, &self.encoding_key)?;
        Ok((compact, full_claims))
    }

    /// Verify a compact JWT: signature, `exp` (with configured skew),
    /// `iss`, and `aud`. Pure, no I/O.
    pub fn verify(&self, token: &str, expected_audience: &str) -> Result<JwtClaims, VerifyError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false; // enforced manually below to apply clock skew
        validation.validate_aud = false; // enforced manually below for a precise error kind
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| VerifyError::Malformed)?;
        let claims = data.claims;

        if claims.iss != self.issuer {
            return Err(VerifyError::WrongIssuer);
        }
        if claims.aud != expected_audience {
            return Err(VerifyError::WrongAudience);
        }

        let now = Utc::now().timestamp();
        let skew = self.clock_skew.num_seconds();
        if claims.exp + skew < now {
            return Err(VerifyError::Expired);
        }

        Ok(claims)
    }

    /// Verify signature and claim shape without enforcing `exp`, as the
    /// revoke endpoint needs: an expired token is still "ours" and still
    /// gets its `jti` recorded so a narrow race against its own expiry
    /// cannot let it through.
    pub fn verify_ignoring_expiry(&self, token: &str) -> Result<JwtClaims, VerifyError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| VerifyError::Malformed)?;
        if data.claims.iss != self.issuer {
            return Err(VerifyError::WrongIssuer);
        }
        Ok(data.claims)
    }

    /// The JWK set this signer publishes at e.g. `/.well-known/jwks.json`.
    pub fn jwk_set(&self) -> Result<JwkKeySet, anyhow::Error> {
        Ok(JwkKeySet {
            keys: vec![self.jwk()?],
        })
    }

    fn jwk(&self) -> Result<Jwk, anyhow::Error> {
        let n = base64::engine::general_purpose::STANDARD.encode(self.public_key.n().to_bytes_be());
        let e = base64::engine::general_purpose::STANDARD.encode(self.public_key.e().to_bytes_be());

        Ok(Jwk {
            common: CommonParameters {
                public_key_use: Some(PublicKeyUse::Signature),
                key_id: Some(self.kid.clone()),
                key_algorithm: Some(KeyAlgorithm::RS256),
                ..Default::default()
            },
            algorithm: AlgorithmParameters::RSA(RSAKeyParameters {
                key_type: RSAKeyType::RSA,
                n,
                e,
                ..Default::default()
            }),
        })
    }
}

/// JSON Web Key Set per RFC 7517, published at the well-known JWKS URL.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct JwkKeySet {
    pub keys: Vec<Jwk>,
}

fn parse_public_key(public_key_pem: &[u8]) -> Result<RsaPublicKey, anyhow::Error> {
    let pem_str = std::str::from_utf8(public_key_pem)?;
    // Public keys may arrive as PKCS#1 ("RSA PUBLIC KEY") or SubjectPublicKeyInfo
    // ("PUBLIC KEY"); accept either, matching what most PEM generators emit.
    if let Ok(key) = RsaPublicKey::from_pkcs1_pem(pem_str) {
        return Ok(key);
    }
    use rsa::pkcs8::DecodePublicKey;
    Ok(RsaPublicKey::from_public_key_pem(pem_str)?)
}

/// RFC 7638 JWK thumbprint: SHA-256 over the canonical `{e, kty, n}` object.
fn jwk_thumbprint(public_key: &RsaPublicKey) -> Result<String, anyhow::Error> {
    let n = base64::engine::general_purpose::STANDARD.encode(public_key.n().to_bytes_be());
    let e = base64::engine::general_purpose::STANDARD.encode(public_key.e().to_bytes_be());

    let canonical = json!({ "e": e, "kty": "RSA", "n": n });
    let canonical_bytes = serde_json::to_vec(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical_bytes);
    let hash = hasher.finalize();

    Ok(URL_SAFE_NO_PAD.encode(hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::EncodeRsaPrivateKey;
    use rsa::pkcs1::EncodeRsaPublicKey;
    use rsa::RsaPrivateKey;

    fn test_keypair() -> (Vec<u8>, Vec<u8>) {
        let mut rng = rand::rngs::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("generate RSA key");
        let public_key = RsaPublicKey::from(&private_key);
        let private_pem = private_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .unwrap()
            .to_string()
            .into_bytes();
        let public_pem = public_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .unwrap()
            .into_bytes();
        (private_pem, public_pem)
    }

    #[test]
    fn sign_then_verify_round_trips_claims() {
        let (priv_pem, pub_pem) = test_keypair();
        let signer = TokenSigner::new("https://issuer.example", &priv_pem, &pub_pem, None, Duration::zero())
            .unwrap();

        let (jwt, signed) = signer
            .sign(ClaimsToSign {
                sub: "user-1",
                aud: "client-1",
                scope: "read",
                token_type: TokenKind::Access,
                client_id: "client-1",
                validity: Duration::minutes(30),
            })
            .unwrap();

        let verified = signer.verify(&jwt, "client-1").unwrap();
        assert_eq!(verified.sub, signed.sub);
        assert_eq!(verified.jti, signed.jti);
        assert!(verified.exp > verified.iat);
    }

    #[test]
    fn verify_rejects_wrong_audience() {
        let (priv_pem, pub_pem) = test_keypair();
        let signer = TokenSigner::new("https://issuer.example", &priv_pem, &pub_pem, None, Duration::zero())
            .unwrap();
        let (jwt, _) = signer
            .sign(ClaimsToSign {
                sub: "user-1",
                aud: "client-1",
                scope: "read",
                token_type: TokenKind::Access,
                client_id: "client-1",
                validity: Duration::minutes(30),
            })
            .unwrap();

        let err = signer.verify(&jwt, "other-client").unwrap_err();
        assert_eq!(err, VerifyError::WrongAudience);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let (priv_pem, pub_pem) = test_keypair();
        let signer = TokenSigner::new("https://issuer.example", &priv_pem, &pub_pem, None, Duration::zero())
            .unwrap();
        let (jwt, _) = signer
            .sign(ClaimsToSign {
                sub: "user-1",
                aud: "client-1",
                scope: "read",
                token_type: TokenKind::Access,
                client_id: "client-1",
                validity: Duration::seconds(-1),
            })
            .unwrap();

        let err = signer.verify(&jwt, "client-1").unwrap_err();
        assert_eq!(err, VerifyError::Expired);
    }

    #[test]
    fn jwk_set_exposes_stable_kid() {
        let (priv_pem, pub_pem) = test_keypair();
        let signer = TokenSigner::new("https://issuer.example", &priv_pem, &pub_pem, None, Duration::zero())
            .unwrap();
        let set = signer.jwk_set().unwrap();
        assert_eq!(set.keys.len(), 1);
        assert_eq!(set.keys[0].common.key_id.as_deref(), Some(signer.kid()));
    }
}
