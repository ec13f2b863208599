#![doc = include_str!("../README.md")]

mod error;

pub mod crc;
pub mod frame;
pub mod router;
pub mod spacepacket;
pub mod time;

#[cfg(feature = "timecode")]
pub mod timecode;

pub use error::{Error, Result};
pub use frame::{encode, read_frames, Channel, Frame, Outcome, ParserContext};
pub use router::{ApidRouter, Router};
pub use spacepacket::{wrap, Apid, Packet, PrimaryHeader};
pub use time::{TickClock, TimeSource};
