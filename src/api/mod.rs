//! JSON API payloads.
//!
//! Request payloads serialize to the exact wire shapes the v1 protocol
//! expects (every request names its `resource`). Not intended to be used
//! directly; provided to aid debugging and custom solvers.

mod authorization;
mod challenge;
mod directory;
mod new_cert;
mod registration;

pub use self::{
    authorization::{Authorization, Identifier, NewAuthz},
    challenge::{Challenge, ChallengeAck, ChallengeState},
    directory::Directory,
    new_cert::NewCert,
    registration::{Agreement, Registration},
};
