//! Issue a certificate with the HTTP-01 solver, writing the challenge file
//! into a local webroot instead of waiting for an operator.

use std::fs;

use acme_v1::{Directory, DirectoryUrl, Issuer, SolveResult, Solver};

const WEBROOT: &str = "./acme-challenges";
const ACCOUNT_KEY: &str = "./account.key";
const CSR: &str = "./domain.csr";

/// Writes the key authorization into the webroot; whatever serves the
/// domain must expose that directory under `/.well-known/acme-challenge/`.
struct WebrootSolver;

impl Solver for WebrootSolver {
    fn name(&self) -> &str {
        "http-01"
    }

    fn solve(&self, domain: &str, token: &str, key_authorization: &str) -> SolveResult {
        let path = format!("{WEBROOT}/{token}");
        log::info!("writing proof for {domain} to {path}");
        fs::write(path, key_authorization)?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    fs::create_dir_all(WEBROOT)?;

    let account_key_pem = fs::read_to_string(ACCOUNT_KEY)?;
    let csr_pem = fs::read_to_string(CSR)?;

    log::info!("fetching directory");
    // Note: change to `DirectoryUrl::LetsEncrypt` in production.
    let dir = Directory::fetch(DirectoryUrl::LetsEncryptStaging).await?;

    let cert_pem = Issuer::new(dir, &account_key_pem)?
        .poll_interval(std::time::Duration::from_secs(5))
        .issue(&csr_pem, &WebrootSolver)
        .await?;

    println!("{cert_pem}");

    Ok(())
}
