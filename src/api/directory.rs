use serde::{Deserialize, Serialize};

/// Directory object for ACME client self-configuration.
///
/// All four endpoints are required; a directory missing any of them is
/// rejected as malformed.
///
/// # Example JSON
///
/// ```json
/// {
///   "new-authz": "https://example.com/acme/new-authz",
///   "new-cert": "https://example.com/acme/new-cert",
///   "new-reg": "https://example.com/acme/new-reg",
///   "revoke-cert": "https://example.com/acme/revoke-cert"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    /// URL for new authorization requests.
    #[serde(rename = "new-authz")]
    pub new_authz: String,

    /// URL for account registration requests.
    #[serde(rename = "new-reg")]
    pub new_reg: String,

    /// URL for certificate issuance requests.
    #[serde(rename = "new-cert")]
    pub new_cert: String,

    /// URL for certificate revocation requests.
    #[serde(rename = "revoke-cert")]
    pub revoke_cert: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_four_endpoints_required() {
        let json = r#"{
            "new-authz": "https://ca/acme/new-authz",
            "new-reg": "https://ca/acme/new-reg",
            "new-cert": "https://ca/acme/new-cert",
            "revoke-cert": "https://ca/acme/revoke-cert"
        }"#;

        let dir: Directory = serde_json::from_str(json).unwrap();
        assert_eq!(dir.new_authz, "https://ca/acme/new-authz");

        let missing = r#"{
            "new-authz": "https://ca/acme/new-authz",
            "new-reg": "https://ca/acme/new-reg",
            "new-cert": "https://ca/acme/new-cert"
        }"#;

        serde_json::from_str::<Directory>(missing).unwrap_err();
    }
}
