//! Wire protocol: packet vocabulary, JSON codec, length-prefixed framing and
//! the typed outbound encoder.

pub mod codec;
pub mod encoder;
pub mod framing;
pub mod messages;

pub use codec::{decode_inbound, decode_outbound, encode_inbound, encode_outbound, DecodeError, EncodeError};
pub use encoder::{PacketEncoder, PacketSink};
pub use framing::{encode_frame, Frame, FramingError, StreamParser, DEFAULT_MAX_FRAME_SIZE};
pub use messages::*;
