//! JSON Web Key and flattened JSON JWS per [RFC 7515 §5.1] and [RFC 7638].
//!
//! [RFC 7515 §5.1]: https://datatracker.ietf.org/doc/html/rfc7515#section-5.1
//! [RFC 7638]: https://datatracker.ietf.org/doc/html/rfc7638

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::{error::Result, key::AccountKey, util::base64url};

/// The account public key in JSON Web Key form.
// LEXICAL ORDER OF FIELDS MATTERS! Serialization of this struct is the
// canonical JWK of RFC 7638: members `e`, `kty`, `n`, no whitespace.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Jwk {
    e: String,
    kty: &'static str,
    n: String,
}

impl From<&AccountKey> for Jwk {
    fn from(key: &AccountKey) -> Jwk {
        Jwk {
            e: base64url(&key.e_bytes()),
            kty: "RSA",
            n: base64url(&key.n_bytes()),
        }
    }
}

impl Jwk {
    /// The canonical JSON encoding hashed for the thumbprint.
    pub(crate) fn canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// RFC 7638 thumbprint: unpadded base64url of SHA-256 over the
    /// canonical JWK.
    pub(crate) fn thumbprint(&self) -> Result<String> {
        Ok(base64url(&Sha256::digest(self.canonical_json()?)))
    }
}

/// Protected header of every signed request.
///
/// The CA only insists on `nonce` being present; `alg` and the embedded
/// public key ride along in every request since v1 has no account key ID.
#[derive(Debug, Serialize)]
struct ProtectedHeader<'a> {
    alg: &'static str,
    jwk: &'a Jwk,
    nonce: &'a str,
}

/// <https://datatracker.ietf.org/doc/html/rfc7515#section-7.2.2>
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FlattenedJsonJws {
    pub(crate) protected: String,
    pub(crate) payload: String,
    pub(crate) signature: String,
}

/// Sign `payload` under `nonce`, producing the flattened JWS JSON body.
///
/// All three segments are unpadded base64url; the signature covers
/// `protected "." payload`.
pub(crate) fn sign(key: &AccountKey, payload: &str, nonce: &str) -> Result<String> {
    let jwk = Jwk::from(key);

    let protected = {
        let header = ProtectedHeader {
            alg: "RS256",
            jwk: &jwk,
            nonce,
        };
        base64url(&serde_json::to_string(&header)?)
    };

    let payload = base64url(payload);

    let to_sign = format!("{protected}.{payload}");
    let signature = base64url(&key.sign(to_sign.as_bytes())?);

    Ok(serde_json::to_string(&FlattenedJsonJws {
        protected,
        payload,
        signature,
    })?)
}

#[cfg(test)]
mod tests {
    use base64::prelude::*;
    use rsa::{
        pkcs1v15::{Signature, VerifyingKey},
        signature::Verifier as _,
    };

    use super::*;
    use crate::test::{ACCOUNT_KEY_PEM, ACCOUNT_KEY_THUMBPRINT};

    // Test key from RFC 7638 §3.1, with its published thumbprint.
    const RFC7638_N: &str = "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT8\
        6zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_R\
        N5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbO\
        pbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8\
        awapJzKnqDKgw";

    fn account_key() -> AccountKey {
        AccountKey::from_pem(ACCOUNT_KEY_PEM).unwrap()
    }

    #[test]
    fn jwk_is_canonical() {
        let jwk = Jwk::from(&account_key());
        let json = jwk.canonical_json().unwrap();

        assert!(json.starts_with(r#"{"e":"AQAB","kty":"RSA","n":""#));
        assert!(!json.contains(char::is_whitespace));

        // byte-for-byte stable across invocations
        assert_eq!(json, Jwk::from(&account_key()).canonical_json().unwrap());
    }

    #[test]
    fn thumbprint_matches_rfc7638_vector() {
        let jwk = Jwk {
            e: "AQAB".to_owned(),
            kty: "RSA",
            n: RFC7638_N.to_owned(),
        };

        assert_eq!(
            jwk.thumbprint().unwrap(),
            "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs",
        );
    }

    #[test]
    fn thumbprint_is_stable() {
        let jwk = Jwk::from(&account_key());
        assert_eq!(jwk.thumbprint().unwrap(), ACCOUNT_KEY_THUMBPRINT);
    }

    #[test]
    fn jws_verifies_and_tampering_breaks_it() {
        let key = account_key();
        let jws = sign(&key, r#"{"resource":"new-reg"}"#, "a-nonce").unwrap();
        let jws: FlattenedJsonJws = serde_json::from_str(&jws).unwrap();

        let verifying_key = VerifyingKey::<Sha256>::new(key.public_key().clone());
        let sig_bytes = BASE64_URL_SAFE_NO_PAD.decode(&jws.signature).unwrap();
        let signature = Signature::try_from(sig_bytes.as_slice()).unwrap();

        let signed = format!("{}.{}", jws.protected, jws.payload);
        verifying_key.verify(signed.as_bytes(), &signature).unwrap();

        // flip one byte of the payload
        let tampered = format!("{}.{}X", jws.protected, jws.payload);
        verifying_key
            .verify(tampered.as_bytes(), &signature)
            .unwrap_err();
    }

    #[test]
    fn protected_header_carries_the_nonce() {
        let jws = sign(&account_key(), "{}", "expected-nonce").unwrap();
        let jws: FlattenedJsonJws = serde_json::from_str(&jws).unwrap();

        let protected = BASE64_URL_SAFE_NO_PAD.decode(&jws.protected).unwrap();
        let protected: serde_json::Value = serde_json::from_slice(&protected).unwrap();

        assert_eq!(protected["alg"], "RS256");
        assert_eq!(protected["nonce"], "expected-nonce");
        assert_eq!(protected["jwk"]["kty"], "RSA");
    }
}
