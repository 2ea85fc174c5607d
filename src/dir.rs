use crate::{
    api,
    error::Result,
    req::{expect_status, req_get, req_replay_nonce},
    util::read_json,
};

const LETSENCRYPT_URL: &str = "https://acme-v01.api.letsencrypt.org/directory";
const LETSENCRYPT_STAGING_URL: &str = "https://acme-staging.api.letsencrypt.org/directory";

/// Enumeration of known ACME API directories.
#[derive(Debug, Clone)]
pub enum DirectoryUrl<'a> {
    /// The main Let's Encrypt directory.
    ///
    /// Not appropriate for testing / development.
    LetsEncrypt,

    /// The staging Let's Encrypt directory.
    ///
    /// Use for testing and development. Doesn't issue "valid" certificates.
    LetsEncryptStaging,

    /// Provide an arbitrary directory URL to connect to.
    Other(&'a str),
}

impl DirectoryUrl<'_> {
    fn to_url(&self) -> &str {
        match self {
            DirectoryUrl::LetsEncrypt => LETSENCRYPT_URL,
            DirectoryUrl::LetsEncryptStaging => LETSENCRYPT_STAGING_URL,
            DirectoryUrl::Other(url) => url,
        }
    }
}

/// Entry point for accessing an ACME API.
///
/// Fetching the directory yields the CA's endpoint URLs and, from the same
/// response, the first `Replay-Nonce` that seeds the session's nonce chain.
#[derive(Debug, Clone)]
pub struct Directory {
    pub(crate) api_directory: api::Directory,
    pub(crate) first_nonce: String,
}

impl Directory {
    /// Fetch the directory over a directory URL.
    pub async fn fetch(url: DirectoryUrl<'_>) -> Result<Directory> {
        let res = req_get(url.to_url()).await?;
        let res = expect_status("directory", res, &[200]).await?;

        let first_nonce = req_replay_nonce(&res)?;
        let api_directory = read_json::<api::Directory>(res).await?;

        log::debug!("directory fetched; nonce chain seeded");

        Ok(Directory {
            api_directory,
            first_nonce,
        })
    }

    /// Returns a reference to the directory's API object.
    ///
    /// Useful for debugging.
    pub fn api_directory(&self) -> &api::Directory {
        &self.api_directory
    }
}
