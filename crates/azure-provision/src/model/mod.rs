//! Wire shapes of the desired-state payloads sent to the control plane, and of the
//! results read back from it. Field names follow the provider's camelCase JSON.

pub mod network;
pub mod storage;

pub use network::*;
pub use storage::*;

use serde::Serialize;
use serde_json::Value;

/// Converts a typed payload into the opaque spec carried by a request.
pub(crate) fn to_spec<T: Serialize>(payload: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(payload)
}
