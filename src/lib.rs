//! Provisioning certificates from ACME v1 providers such as
//! [Let's Encrypt](https://letsencrypt.org/).
//!
//! This is the protocol generation that predates [RFC 8555]: every request
//! names its `resource`, the account public key rides along in each JWS, and
//! the endpoints are `new-reg` / `new-authz` / `new-cert`.
//!
//! # Usage
//!
//! The one-call path issues with the defaults (production directory, DNS-01
//! with operator confirmation):
//!
//! ```no_run
//! # async fn run() -> acme_v1::Result<()> {
//! let account_key_pem = std::fs::read_to_string("account.key").unwrap();
//! let csr_pem = std::fs::read_to_string("domain.csr").unwrap();
//!
//! let cert_pem = acme_v1::get_crt(&account_key_pem, &csr_pem).await?;
//! # Ok(()) }
//! ```
//!
//! For a different directory, solver, or polling behavior, compose the
//! pieces:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use acme_v1::{Directory, DirectoryUrl, HttpSolver, Issuer};
//!
//! # async fn run() -> acme_v1::Result<()> {
//! # let account_key_pem = ""; let csr_pem = "";
//! let dir = Directory::fetch(DirectoryUrl::LetsEncryptStaging).await?;
//!
//! let cert_pem = Issuer::new(dir, account_key_pem)?
//!     .poll_interval(Duration::from_secs(5))
//!     .max_polls(60)
//!     .issue(csr_pem, &HttpSolver)
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! # Domain Ownership
//!
//! Every domain named by the CSR (subject CN plus SAN dNSNames) is
//! authorized separately, in CSR order, before the certificate request is
//! submitted. Proving ownership means publishing a challenge artifact:
//!
//! - [`HttpSolver`]: a file under `/.well-known/acme-challenge/` on the
//!   domain's web server;
//! - [`DnsSolver`]: a TXT record under `_acme-challenge.<domain>`.
//!
//! The built-in solvers print what to publish and wait for a keypress;
//! automated deployments implement [`Solver`] instead.
//!
//! # Rate Limits
//!
//! Let's Encrypt applies [rate limits], so avoid very low `poll_interval`
//! values and prefer the staging directory for development — see
//! [`DirectoryUrl::LetsEncryptStaging`].
//!
//! [RFC 8555]: https://datatracker.ietf.org/doc/html/rfc8555
//! [rate limits]: https://letsencrypt.org/docs/rate-limits

#![deny(rust_2018_idioms, nonstandard_style, future_incompatible)]

mod cert;
mod dir;
mod error;
mod issue;
mod jws;
mod key;
mod req;
mod solver;
mod trans;
mod util;

pub mod api;

#[cfg(test)]
mod test;

pub use crate::{
    dir::{Directory, DirectoryUrl},
    error::{Error, Result},
    issue::{Issuer, Sleeper},
    solver::{dns_txt_value, DnsSolver, HttpSolver, SolveResult, Solver},
};

/// Obtain a certificate for `csr_pem`, signing with `account_key_pem`.
///
/// Uses the Let's Encrypt production directory and the interactive
/// [`DnsSolver`]. Returns the issued certificate as a PEM string. For any
/// other combination, see [`Directory::fetch`] and [`Issuer`].
pub async fn get_crt(account_key_pem: &str, csr_pem: &str) -> Result<String> {
    let directory = Directory::fetch(DirectoryUrl::LetsEncrypt).await?;

    Issuer::new(directory, account_key_pem)?
        .issue(csr_pem, &DnsSolver)
        .await
}
