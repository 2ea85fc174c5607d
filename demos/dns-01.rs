//! Issue a certificate with the interactive DNS-01 solver.
//!
//! The solver prints the `_acme-challenge` TXT record to create and waits
//! for a keypress before letting the CA validate.

use std::fs;

use acme_v1::{Directory, DirectoryUrl, DnsSolver, Issuer};

const ACCOUNT_KEY: &str = "./account.key";
const CSR: &str = "./domain.csr";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let account_key_pem = fs::read_to_string(ACCOUNT_KEY)?;
    let csr_pem = fs::read_to_string(CSR)?;

    log::info!("fetching directory");
    // Note: change to `DirectoryUrl::LetsEncrypt` in production.
    let dir = Directory::fetch(DirectoryUrl::LetsEncryptStaging).await?;

    let cert_pem = Issuer::new(dir, &account_key_pem)?
        .poll_interval(std::time::Duration::from_secs(30))
        .issue(&csr_pem, &DnsSolver)
        .await?;

    println!("{cert_pem}");

    Ok(())
}
