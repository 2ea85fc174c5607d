use serde::{Deserialize, Serialize};

/// A challenge as offered inside an [`Authorization`](super::Authorization).
///
/// `token` and `uri` stay optional at parse time; their absence is only an
/// error once a solver selects the challenge.
///
/// # Example JSON
///
/// ```json
/// {
///   "type": "http-01",
///   "status": "pending",
///   "uri": "https://example.com/acme/challenge/asdf/0",
///   "token": "MUi-gqeOJdRkSb_YR2eaMxQBqf6al8dgt_dOttSWb0w"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge type, e.g. `http-01` or `dns-01`.
    #[serde(rename = "type")]
    pub _type: String,

    /// Unique identifier of the challenge; half of the key authorization.
    pub token: Option<String>,

    /// URL the acknowledgement is POSTed to and the status polled from.
    pub uri: Option<String>,

    pub status: Option<String>,
}

/// Acknowledgement POSTed to a challenge URL once its proof is published.
///
/// Serializes to
/// `{"resource":"challenge","type":"<type>","keyAuthorization":"<KA>"}`.
/// The CA requires the `type` member even though contemporary protocol
/// drafts omitted it.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeAck {
    resource: &'static str,

    #[serde(rename = "type")]
    _type: String,

    #[serde(rename = "keyAuthorization")]
    key_authorization: String,
}

impl ChallengeAck {
    pub fn new(_type: &str, key_authorization: &str) -> ChallengeAck {
        ChallengeAck {
            resource: "challenge",
            _type: _type.to_owned(),
            key_authorization: key_authorization.to_owned(),
        }
    }
}

/// The slice of a polled challenge body the client inspects.
///
/// A missing `status` counts as `pending`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeState {
    pub status: Option<String>,
}
