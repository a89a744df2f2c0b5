//! The PKCE Verifier (RFC 7636).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rsa::sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::model::CodeChallengeMethod;

/// Verifier length bounds from RFC 7636 §4.1: 43–128 characters drawn from
/// the unreserved character set `[A-Za-z0-9\-._~]`.
const MIN_VERIFIER_LEN: usize = 43;
const MAX_VERIFIER_LEN: usize = 128;

/// Whether `code_verifier` satisfies RFC 7636's length and charset
/// constraints. Handlers should check this before calling [`verify`] so a
/// malformed verifier reports `invalid_request` rather than a PKCE mismatch.
pub fn is_valid_verifier_shape(code_verifier: &str) -> bool {
    let len = code_verifier.len();
    if !(MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&len) {
        return false;
    }
    code_verifier
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

/// Check `code_verifier` against the `code_challenge` recorded on the
/// authorization code, per §4.3.
///
/// `plain` is gated by `allow_plain`, set from the server configuration /
/// client record; when a `plain` challenge is presented but not allowed,
/// this returns `false` rather than ever comparing the values.
pub fn verify(
    code_verifier: &str,
    code_challenge: &str,
    method: CodeChallengeMethod,
    allow_plain: bool,
) -> bool {
    match method {
        CodeChallengeMethod::Plain => {
            allow_plain && constant_time_eq(code_verifier.as_bytes(), code_challenge.as_bytes())
        }
        CodeChallengeMethod::S256 => {
            let mut hasher = Sha256::new();
            hasher.update(code_verifier.as_bytes());
            let digest = hasher.finalize();
            let computed = URL_SAFE_NO_PAD.encode(digest);
            constant_time_eq(computed.as_bytes(), code_challenge.as_bytes())
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s256_matches_rfc7636_worked_example() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
        assert!(is_valid_verifier_shape(verifier));
        assert!(verify(verifier, challenge, CodeChallengeMethod::S256, false));
    }

    #[test]
    fn s256_rejects_mismatched_verifier() {
        let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
        assert!(!verify(
            "a-totally-different-verifier-value-of-right-length!!",
            challenge,
            CodeChallengeMethod::S256,
            false
        ));
    }

    #[test]
    fn plain_requires_exact_match_and_opt_in() {
        assert!(verify("same-value", "same-value", CodeChallengeMethod::Plain, true));
        assert!(!verify("same-value", "same-value", CodeChallengeMethod::Plain, false));
        assert!(!verify("a", "b", CodeChallengeMethod::Plain, true));
    }

    #[test]
    fn verifier_shape_rejects_out_of_range_lengths() {
        assert!(!is_valid_verifier_shape(&"a".repeat(42)));
        assert!(!is_valid_verifier_shape(&"a".repeat(129)));
        assert!(!is_valid_verifier_shape("not unreserved chars!!"));
    }
}
