//! Schema-bound binary codec for multi-channel telemetry frames.
//!
//! Both ends of a stream agree once on an ordered list of channel keys and
//! data types (a [`Schema`]). After that, every frame is encoded as:
//! - A presence bitmask of `ceil(N/8)` bytes, one bit per schema channel
//! - For each present channel, in schema order, a 4-byte little-endian
//!   sample count followed by the raw little-endian sample bytes
//!
//! Channel identity and type are never repeated on the wire.

pub mod codec;
pub mod config;
pub mod data_type;
pub mod error;
pub mod frame;
pub mod mask;
pub mod reader;
pub mod schema;
pub mod series;
pub mod writer;

#[cfg(feature = "async")]
pub mod framed;
#[cfg(feature = "json")]
pub mod json;

pub use codec::{decode_message, encode_message, Codec, COUNT_SIZE, LENGTH_PREFIX_SIZE};
pub use config::{CodecConfig, DEFAULT_MAX_MESSAGE_SIZE};
pub use data_type::{ChannelKey, DataType, Sample, TimeStamp};
pub use error::{CodecError, Result};
pub use frame::Frame;
pub use mask::PresenceMask;
pub use reader::MessageReader;
pub use schema::Schema;
pub use series::Series;
pub use writer::MessageWriter;

#[cfg(feature = "async")]
pub use framed::FrameCodec;
#[cfg(feature = "json")]
pub use json::JsonCodec;
