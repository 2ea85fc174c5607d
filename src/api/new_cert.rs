use serde::Serialize;

/// Payload of the final issuance call.
///
/// Serializes to `{"resource":"new-cert","csr":"<base64url DER>"}`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCert {
    resource: &'static str,
    csr: String,
}

impl NewCert {
    pub fn new(csr_der_base64url: String) -> NewCert {
        NewCert {
            resource: "new-cert",
            csr: csr_der_base64url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cert_shape() {
        let json = serde_json::to_string(&NewCert::new("TUlJ".to_owned())).unwrap();
        assert_eq!(json, r#"{"resource":"new-cert","csr":"TUlJ"}"#);
    }
}
