use std::result;

pub type Result<T, E = Error> = result::Result<T, E>;

/// Any failure an issuance run can abort with.
///
/// No error is recovered locally; the first failure is returned to the caller
/// with enough context (endpoint, status code, body) to diagnose it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The account PEM did not contain exactly one RSA private key.
    #[error("bad account key: {0}")]
    BadKey(String),

    /// The CSR PEM contained zero or more than one certificate request.
    #[error("bad CSR: {0}")]
    BadCsr(String),

    /// A response that must carry `Replay-Nonce` did not.
    ///
    /// The nonce chain is broken at this point and the session cannot
    /// continue.
    #[error("response is missing the Replay-Nonce header")]
    NoNonce,

    /// A response body was not JSON or lacked a required field.
    #[error("malformed response: {0}")]
    MalformedJson(String),

    /// An HTTP status not whitelisted for the current protocol step.
    #[error("unexpected status from {endpoint}: {code} body: {body:?}")]
    UnexpectedStatus {
        endpoint: &'static str,
        code: u16,
        body: String,
    },

    /// The authorization offered no challenge the solver selects.
    #[error("no challenge supported by solver {solver:?} was offered")]
    NoSupportedChallenge { solver: String },

    /// Polling returned a challenge status other than `pending` or `valid`.
    #[error("challenge for {domain} was rejected with status {status:?}")]
    ChallengeRejected { domain: String, status: String },

    /// The configured poll cap was hit before the challenge turned valid.
    #[error("challenge for {domain} still pending after {polls} polls")]
    PollTimeout { domain: String, polls: usize },

    /// The `new-cert` body was not a decodable DER certificate.
    #[error("bad certificate: {0}")]
    BadCert(String),

    /// The solver side effect reported failure.
    #[error("solver failed: {0}")]
    SolverFailed(String),

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("signing: {0}")]
    Signing(#[from] rsa::signature::Error),
}
