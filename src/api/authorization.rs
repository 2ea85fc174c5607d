use serde::{Deserialize, Serialize};

use crate::api;

/// An identifier to be authorized, always of type `dns` here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub _type: String,

    pub value: String,
}

impl Identifier {
    pub fn dns(domain: &str) -> Identifier {
        Identifier {
            _type: "dns".to_owned(),
            value: domain.to_owned(),
        }
    }
}

/// Payload of the per-domain authorization call.
///
/// Serializes to
/// `{"resource":"new-authz","identifier":{"type":"dns","value":"<domain>"}}`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAuthz {
    resource: &'static str,
    identifier: Identifier,
}

impl NewAuthz {
    pub fn dns(domain: &str) -> NewAuthz {
        NewAuthz {
            resource: "new-authz",
            identifier: Identifier::dns(domain),
        }
    }
}

/// Authorization object returned by `new-authz`.
///
/// Only the challenge list is consumed: the solver's selector runs over it
/// and the first match wins.
#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    pub identifier: Option<Identifier>,

    pub status: Option<String>,

    pub challenges: Vec<api::Challenge>,
}
