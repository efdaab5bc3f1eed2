//! Wire encoding for interaction messages.
//!
//! JSON, tagged by `kind`. The presenter decodes it with no negotiation, so
//! field names here are a compatibility contract.

use bytes::Bytes;

use super::models::InteractionMessage;

pub fn encode(message: &InteractionMessage) -> serde_json::Result<Bytes> {
    serde_json::to_vec(message).map(Bytes::from)
}
