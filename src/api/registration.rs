use serde::Serialize;

/// Payload of the account registration call.
///
/// Serializes to `{"resource":"new-reg"}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Registration {
    resource: &'static str,
}

impl Registration {
    pub fn new() -> Registration {
        Registration {
            resource: "new-reg",
        }
    }
}

/// Terms-of-service acceptance, POSTed to the account URL the CA returned
/// in `Location`.
///
/// Serializes to `{"resource":"reg","agreement":"<uri>"}`.
#[derive(Debug, Clone, Serialize)]
pub struct Agreement {
    resource: &'static str,
    agreement: String,
}

impl Agreement {
    pub fn new(terms_uri: impl Into<String>) -> Agreement {
        Agreement {
            resource: "reg",
            agreement: terms_uri.into(),
        }
    }
}
