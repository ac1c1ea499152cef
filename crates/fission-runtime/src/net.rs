//! Network transport contract.
//!
//! Cross-plant delivery is a hand-off: `emit_net(value)` serializes
//! the value into a [`NetworkFrame`] and gives it to the installed
//! [`NetworkTransport`]; a transport that receives a frame from the
//! wire decodes it and re-emits the value locally. The core never
//! sees sockets or wire formats.
//!
//! Frames carry the originating [`PlantId`] so a broadcast transport
//! can drop its own reflections, and the Rust type name so the
//! receiving side can route the payload. Type names are only stable
//! across builds of the same crate graph; mixed-version fleets should
//! pin their event types in a shared crate.

use fission_types::{ErrorCode, PlantId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One serialized emit, as handed to and from a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkFrame {
    /// The plant that emitted the value.
    pub plant: PlantId,
    /// Rust type name of the payload, used for routing on arrival.
    pub type_name: String,
    /// The value, as JSON.
    pub payload: serde_json::Value,
}

impl NetworkFrame {
    /// Serializes `value` into a frame originating from `plant`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Encode`] when the value does not serialize.
    pub fn encode<T: Serialize + 'static>(plant: PlantId, value: &T) -> Result<Self, NetError> {
        let payload =
            serde_json::to_value(value).map_err(|e| NetError::Encode(e.to_string()))?;
        Ok(Self {
            plant,
            type_name: std::any::type_name::<T>().to_string(),
            payload,
        })
    }

    /// Deserializes the payload as `T`, checking the recorded type.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::TypeMismatch`] when the frame was encoded
    /// from a different type, [`NetError::Decode`] when the payload
    /// does not parse.
    pub fn decode<T: DeserializeOwned + 'static>(&self) -> Result<T, NetError> {
        let expected = std::any::type_name::<T>();
        if self.type_name != expected {
            return Err(NetError::TypeMismatch {
                expected: expected.to_string(),
                found: self.type_name.clone(),
            });
        }
        serde_json::from_value(self.payload.clone()).map_err(|e| NetError::Decode(e.to_string()))
    }
}

/// Contract between the plant and an external wire transport.
///
/// On local `emit_net`, the plant calls [`send`](Self::send). On
/// arrival from the wire, the transport decodes the frame and calls
/// the plant's local emit with the value — delivery is fire-and-forget
/// from there on.
pub trait NetworkTransport: Send + Sync {
    /// Ships one frame toward the other plants.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Transport`] when the frame cannot be sent.
    fn send(&self, frame: NetworkFrame) -> Result<(), NetError>;
}

/// Network hand-off failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetError {
    /// The value failed to serialize.
    #[error("failed to encode frame: {0}")]
    Encode(String),

    /// The payload failed to deserialize.
    #[error("failed to decode frame: {0}")]
    Decode(String),

    /// The frame carries a different type than requested.
    #[error("frame type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// The transport could not ship the frame.
    #[error("transport failure: {0}")]
    Transport(String),

    /// `emit_net` was called on a plant without a transport.
    #[error("no network transport installed")]
    NoTransport,
}

impl ErrorCode for NetError {
    fn code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "NET_ENCODE_FAILED",
            Self::Decode(_) => "NET_DECODE_FAILED",
            Self::TypeMismatch { .. } => "NET_TYPE_MISMATCH",
            Self::Transport(_) => "NET_TRANSPORT_FAILURE",
            Self::NoTransport => "NET_NO_TRANSPORT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fission_types::assert_error_codes;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Pose {
        x: f64,
        y: f64,
    }

    #[test]
    fn frame_round_trip() {
        let plant = PlantId::new();
        let frame = NetworkFrame::encode(plant, &Pose { x: 1.0, y: -2.5 }).unwrap();

        assert_eq!(frame.plant, plant);
        let back: Pose = frame.decode().unwrap();
        assert_eq!(back, Pose { x: 1.0, y: -2.5 });
    }

    #[test]
    fn decode_rejects_wrong_type() {
        let frame = NetworkFrame::encode(PlantId::new(), &Pose { x: 0.0, y: 0.0 }).unwrap();
        let err = frame.decode::<u32>().unwrap_err();
        assert_eq!(err.code(), "NET_TYPE_MISMATCH");
    }

    #[test]
    fn error_codes_valid() {
        assert_error_codes(
            &[
                NetError::Encode("e".into()),
                NetError::Decode("d".into()),
                NetError::TypeMismatch {
                    expected: "a".into(),
                    found: "b".into(),
                },
                NetError::Transport("t".into()),
                NetError::NoTransport,
            ],
            "NET_",
        );
    }
}
