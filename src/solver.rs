//! Challenge solvers.
//!
//! A solver is the strategy the per-domain authorization step plugs in: a
//! challenge type name, a selector over the challenges the CA offers, and a
//! side effect that publishes the proof. The built-in [`HttpSolver`] and
//! [`DnsSolver`] print what must be published and wait for the operator to
//! confirm; automated deployments implement [`Solver`] themselves.

use std::io::{self, BufRead as _, Write as _};

use sha2::{Digest as _, Sha256};

use crate::{api, util::base64url};

/// Outcome of a solver side effect.
///
/// Failures are surfaced to the issuance run as
/// [`Error::SolverFailed`](crate::Error::SolverFailed).
pub type SolveResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A pluggable challenge strategy.
pub trait Solver {
    /// The challenge type this solver handles, e.g. `"http-01"`.
    ///
    /// Sent back to the CA in the acknowledgement payload.
    fn name(&self) -> &str;

    /// Whether this solver can satisfy `challenge`.
    ///
    /// Runs over the authorization's challenge list in order; the first
    /// match wins. The default matches on the challenge type.
    fn select(&self, challenge: &api::Challenge) -> bool {
        challenge._type == self.name()
    }

    /// Publish the proof for `domain`.
    ///
    /// Called once per domain, before the challenge is acknowledged to the
    /// CA. Blocking here is fine; the run waits. Implementations must not
    /// retain anything beyond the call.
    fn solve(&self, domain: &str, token: &str, key_authorization: &str) -> SolveResult;
}

/// `token "." thumbprint` — the value a validated challenge must expose.
pub(crate) fn key_authorization(token: &str, thumbprint: &str) -> String {
    format!("{token}.{thumbprint}")
}

/// The TXT record value for DNS-01: unpadded base64url of the SHA-256 of
/// the key authorization.
pub fn dns_txt_value(key_authorization: &str) -> String {
    base64url(&Sha256::digest(key_authorization))
}

/// Built-in HTTP-01 solver.
///
/// Prints the file that must be served under
/// `/.well-known/acme-challenge/<token>` and blocks until the operator
/// confirms with a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpSolver;

impl Solver for HttpSolver {
    fn name(&self) -> &str {
        "http-01"
    }

    fn solve(&self, domain: &str, token: &str, key_authorization: &str) -> SolveResult {
        println!(
            "Serve a file at\n\n  \
             http://{domain}/.well-known/acme-challenge/{token}\n\n\
             with this exact body:\n\n  {key_authorization}\n",
        );

        wait_for_confirmation()
    }
}

/// Built-in DNS-01 solver.
///
/// Prints the `_acme-challenge` TXT record to create and blocks until the
/// operator confirms with a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsSolver;

impl Solver for DnsSolver {
    fn name(&self) -> &str {
        "dns-01"
    }

    fn solve(&self, domain: &str, _token: &str, key_authorization: &str) -> SolveResult {
        let txt = dns_txt_value(key_authorization);

        println!(
            "Create a DNS record\n\n  \
             _acme-challenge.{domain}.  300  IN  TXT  \"{txt}\"\n",
        );

        wait_for_confirmation()
    }
}

fn wait_for_confirmation() -> SolveResult {
    print!("Press Enter once it is published and visible... ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::ACCOUNT_KEY_THUMBPRINT;

    fn challenge(_type: &str) -> api::Challenge {
        api::Challenge {
            _type: _type.to_owned(),
            token: Some("tok".to_owned()),
            uri: Some("https://ca/acme/challenge/1".to_owned()),
            status: Some("pending".to_owned()),
        }
    }

    #[test]
    fn key_authorization_is_token_dot_thumbprint() {
        assert_eq!(
            key_authorization("tok", ACCOUNT_KEY_THUMBPRINT),
            format!("tok.{ACCOUNT_KEY_THUMBPRINT}"),
        );
    }

    #[test]
    fn dns_txt_value_is_hashed_and_unpadded() {
        let ka = key_authorization("tok", ACCOUNT_KEY_THUMBPRINT);
        let txt = dns_txt_value(&ka);

        assert_eq!(txt, "WTyd6D7FsFza5dWPumeO-rQnvF6VYq9dUDyJj6eZBGc");
        assert!(!txt.contains('='));
    }

    #[test]
    fn selector_matches_on_type() {
        assert!(HttpSolver.select(&challenge("http-01")));
        assert!(!HttpSolver.select(&challenge("tls-sni-01")));
        assert!(DnsSolver.select(&challenge("dns-01")));
        assert!(!DnsSolver.select(&challenge("http-01")));
    }
}
