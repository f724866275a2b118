//! Network protocol for Vantage.
//!
//! Defines the messages exchanged between the authority and predicting
//! peers, and a compact binary codec. Delivery itself (sockets, channels,
//! reliability) is left to the transport.

pub mod codec;
pub mod messages;

pub use codec::*;
pub use messages::*;
