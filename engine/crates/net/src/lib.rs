pub mod channels;
pub mod frame;
pub mod protocol;
pub mod writer;

pub use channels::{outbound_channel, Outbound, OutboundRx, OutboundTx};
pub use frame::{decode_line, encode_packet, FrameBuffer, FrameError, DEFAULT_MAX_LINE_LEN};
pub use protocol::{Directive, Packet};
pub use writer::spawn_writer;
