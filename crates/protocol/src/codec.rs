//! Binary codec for network messages.
//!
//! Provides efficient serialization for network transmission.

use thiserror::Error;

use crate::NetMessage;

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

/// Encode a message to bytes.
pub fn encode(message: &NetMessage) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(message, bincode::config::standard())?)
}

/// Decode a message from bytes.
pub fn decode(data: &[u8]) -> Result<NetMessage, CodecError> {
    let (message, read) = bincode::serde::decode_from_slice(data, bincode::config::standard())?;
    if read < data.len() {
        log::trace!("ignoring {} trailing bytes after message", data.len() - read);
    }
    Ok(message)
}

/// Estimate the encoded size of a message.
/// Useful for buffer allocation.
pub fn estimate_size(message: &NetMessage) -> usize {
    const INPUT: usize = 20; // two axes, buttons, look delta, tick
    match message {
        NetMessage::Input(_) => 4 + INPUT,
        NetMessage::InputBatch(m) => 6 + m.inputs.len() * INPUT,
        NetMessage::Reconcile(_) => 96,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InputBatchMessage, InputMessage};
    use glam::{Vec2, Vec3};
    use vantage_game::ReconciliationSnapshot;
    use vantage_physics::{CommandButtons, InputRecord, LookRotation, PhysicalState};

    fn input(tick: u32) -> InputRecord {
        let mut buttons = CommandButtons::default();
        buttons.press(CommandButtons::JUMP);
        InputRecord::new(-0.5, 1.0, buttons, Vec2::new(0.01, -0.02)).with_tick(tick)
    }

    #[test]
    fn roundtrip_input_batch() {
        let msg = NetMessage::InputBatch(InputBatchMessage {
            entity: 3,
            inputs: vec![input(10), input(11)],
        });

        let encoded = encode(&msg).unwrap();
        assert_eq!(decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn roundtrip_snapshot() {
        let mut physical = PhysicalState::new(Vec3::new(1.0, 2.0, 3.0));
        physical.velocity = Vec3::new(0.0, -4.0, 0.5);
        physical.pause_ground_constraint();

        let msg = NetMessage::Reconcile(ReconciliationSnapshot {
            entity: 1,
            tick: 100,
            physical,
            jump_count: 2,
            gravity: Vec3::new(0.0, 9.81, 0.0),
            look: LookRotation::new(0.3, -1.2),
            crouch_height: 1.0,
            crouch_intent: true,
        });

        let encoded = encode(&msg).unwrap();
        assert_eq!(decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn compact_encoding() {
        let msg = NetMessage::Input(InputMessage {
            entity: 1,
            input: input(100),
        });

        let encoded = encode(&msg).unwrap();
        assert!(encoded.len() <= estimate_size(&msg), "encoded size was {}", encoded.len());
    }

    #[test]
    fn truncated_data_fails() {
        let msg = NetMessage::Input(InputMessage {
            entity: 1,
            input: input(7),
        });
        let encoded = encode(&msg).unwrap();

        let result = decode(&encoded[..encoded.len() / 2]);
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }
}
