use serde::Serialize;

use crate::{
    error::Result,
    jws,
    key::AccountKey,
    req::{req_post, req_replay_nonce},
};

/// Signed POST transport for one issuance session.
///
/// Owns the session's single nonce slot: every call signs the payload with
/// the current nonce and installs the response's `Replay-Nonce` as the next,
/// so requests are totally ordered with respect to server responses. A
/// response without `Replay-Nonce` is fatal.
///
/// Concurrent issuance runs need distinct transports; the slot is not
/// shareable.
#[derive(Debug)]
pub(crate) struct Transport {
    key: AccountKey,
    nonce: String,
}

impl Transport {
    /// `first_nonce` is the one captured from the directory fetch.
    pub(crate) fn new(key: AccountKey, first_nonce: String) -> Transport {
        Transport {
            key,
            nonce: first_nonce,
        }
    }

    pub(crate) fn key(&self) -> &AccountKey {
        &self.key
    }

    /// Install a nonce observed on an unauthenticated response, keeping the
    /// chain current.
    pub(crate) fn refresh_nonce(&mut self, nonce: String) {
        log::trace!("refreshing nonce");
        self.nonce = nonce;
    }

    /// Sign `payload` with the current nonce and POST it to `url`.
    ///
    /// Status checking is the caller's business; the nonce exchange is not.
    pub(crate) async fn call<T>(&mut self, url: &str, payload: &T) -> Result<reqwest::Response>
    where
        T: Serialize + ?Sized,
    {
        let payload_json = serde_json::to_string(payload)?;
        let body = jws::sign(&self.key, &payload_json, &self.nonce)?;

        log::debug!("call endpoint: {url}");
        let res = req_post(url, body).await?;

        self.nonce = req_replay_nonce(&res)?;

        Ok(res)
    }
}
