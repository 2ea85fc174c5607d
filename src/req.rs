use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::{Error, Result};

fn client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(30))
        .build()?)
}

pub(crate) async fn req_get(url: &str) -> Result<reqwest::Response> {
    log::debug!("GET {url}");
    Ok(client()?.get(url).send().await?)
}

/// POST the signed JWS body. `Content-Length` is derived from the body; the
/// CA does not require a `Content-Type`.
pub(crate) async fn req_post(url: &str, body: String) -> Result<reqwest::Response> {
    log::debug!("POST {url}");
    log::trace!("{body}");
    Ok(client()?.post(url).body(body).send().await?)
}

pub(crate) async fn req_safe_read_body(res: reqwest::Response) -> String {
    // letsencrypt sometimes closes the TLS abruptly causing io error
    // even though we did capture the body.
    res.text().await.unwrap_or_default()
}

/// Pass the response through when its status is on the step's whitelist.
pub(crate) async fn expect_status(
    endpoint: &'static str,
    res: reqwest::Response,
    allowed: &[u16],
) -> Result<reqwest::Response> {
    let code = res.status().as_u16();

    if allowed.contains(&code) {
        return Ok(res);
    }

    let body = req_safe_read_body(res).await;
    Err(Error::UnexpectedStatus {
        endpoint,
        code,
        body,
    })
}

pub(crate) fn req_expect_header(res: &reqwest::Response, name: &str) -> Result<String> {
    res.headers()
        .get(name)
        .and_then(|val| val.to_str().ok())
        .map(ToOwned::to_owned)
        .ok_or_else(|| Error::MalformedJson(format!("response lacks the {name} header")))
}

/// The anti-replay nonce every authenticated exchange must produce.
pub(crate) fn req_replay_nonce(res: &reqwest::Response) -> Result<String> {
    replay_nonce_opt(res.headers()).ok_or(Error::NoNonce)
}

pub(crate) fn replay_nonce_opt(headers: &HeaderMap) -> Option<String> {
    headers
        .get("replay-nonce")
        .and_then(|val| val.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Target of the first `Link` header whose `rel` parameter equals `rel`.
///
/// Handles multiple comma-separated links per header value as well as
/// repeated headers.
pub(crate) fn link_with_rel(headers: &HeaderMap, rel: &str) -> Option<String> {
    for value in headers.get_all("link") {
        let Ok(value) = value.to_str() else {
            continue;
        };

        for link in value.split(',') {
            let mut parts = link.split(';');

            let Some(target) = parts.next() else {
                continue;
            };
            let target = target.trim();

            if !(target.starts_with('<') && target.ends_with('>')) {
                continue;
            }

            let rel_matches = parts.any(|param| match param.trim().split_once('=') {
                Some(("rel", val)) => val.trim_matches('"') == rel,
                _ => false,
            });

            if rel_matches {
                return Some(target[1..target.len() - 1].to_owned());
            }
        }
    }

    None
}
