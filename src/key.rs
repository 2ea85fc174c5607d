use rsa::{
    pkcs1::DecodeRsaPrivateKey as _,
    pkcs1v15::SigningKey,
    pkcs8::DecodePrivateKey as _,
    signature::{SignatureEncoding as _, Signer as _},
    traits::PublicKeyParts as _,
    RsaPrivateKey, RsaPublicKey,
};
use sha2::Sha256;

use crate::error::{Error, Result};

/// The account's RSA key pair.
///
/// Signs every request of the session; its public half is the `jwk` embedded
/// in each protected header, and its thumbprint appears in every key
/// authorization.
#[derive(Clone, Debug)]
pub(crate) struct AccountKey {
    signing_key: SigningKey<Sha256>,
    public_key: RsaPublicKey,
}

impl AccountKey {
    /// Parse the account private key from PEM.
    ///
    /// The PEM must contain exactly one private-key block (PKCS#1 or PKCS#8)
    /// holding an RSA key.
    pub(crate) fn from_pem(pem: &str) -> Result<AccountKey> {
        let mut keys = Vec::new();

        for item in rustls_pemfile::read_all(&mut pem.as_bytes()) {
            let item = item.map_err(|err| Error::BadKey(format!("unreadable PEM: {err}")))?;

            let key = match item {
                rustls_pemfile::Item::Pkcs1Key(der) => {
                    RsaPrivateKey::from_pkcs1_der(der.secret_pkcs1_der())
                        .map_err(|err| err.to_string())
                }
                rustls_pemfile::Item::Pkcs8Key(der) => {
                    RsaPrivateKey::from_pkcs8_der(der.secret_pkcs8_der())
                        .map_err(|err| err.to_string())
                }
                _ => return Err(Error::BadKey("PEM block is not a private key".to_owned())),
            };

            keys.push(key.map_err(Error::BadKey)?);
        }

        if keys.len() != 1 {
            return Err(Error::BadKey(format!(
                "expected exactly one RSA key, found {}",
                keys.len(),
            )));
        }

        Ok(Self::from_key(keys.remove(0)))
    }

    fn from_key(private_key: RsaPrivateKey) -> AccountKey {
        let public_key = RsaPublicKey::from(&private_key);

        AccountKey {
            signing_key: SigningKey::new(private_key),
            public_key,
        }
    }

    /// RS256 signature over `msg`: PKCS#1 v1.5 padding of the SHA-256
    /// DigestInfo.
    pub(crate) fn sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        Ok(self.signing_key.try_sign(msg)?.to_vec())
    }

    /// Public modulus, big-endian with no leading zero bytes.
    pub(crate) fn n_bytes(&self) -> Vec<u8> {
        self.public_key.n().to_bytes_be()
    }

    /// Public exponent, big-endian with no leading zero bytes.
    pub(crate) fn e_bytes(&self) -> Vec<u8> {
        self.public_key.e().to_bytes_be()
    }

    #[cfg(test)]
    pub(crate) fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }
}
