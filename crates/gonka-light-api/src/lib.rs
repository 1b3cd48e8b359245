//! # Gonka Light API
//!
//! The I/O-facing half of gonka-light: JSON adapters for the participants
//! endpoint and the CometBFT RPC, verified endpoint extraction, and a
//! [`RestSource`] that feeds the custody walk from any byte [`Transport`].
//!
//! Nothing here decides trust. Every participant list still goes through
//! `gonka_light_core` before an endpoint is handed out.

pub mod endpoints;
pub mod payload;
pub mod source;

#[cfg(test)]
mod testutil;

pub use endpoints::{
    endpoints_from_payload, endpoints_from_set, ensure_v1, participants_from_payload, Endpoint,
    EndpointError,
};
pub use payload::{parse_block, parse_validators, ApiParticipantsResponse, PayloadError};
pub use source::{RestSource, Transport};
