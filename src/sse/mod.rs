//! Line protocol for streamed chat responses.
//!
//! The backend streams one record per line:
//! - `data: <json>` - a record payload
//! - `data: [DONE]` - end of stream sentinel
//! - anything else - ignored (keep-alives, comments)
//!
//! # Module structure
//! - `buffer` - Chunk reassembly (LineBuffer)
//! - `events` - Record types (StreamRecord, ParsedLine, DecodeError)
//! - `payloads` - Internal payload deserialization structs
//! - `parser` - Line classification and payload decoding

mod buffer;
mod events;
mod parser;
mod payloads;

pub use buffer::LineBuffer;
pub use events::{DecodeError, ParsedLine, StreamRecord};
pub use parser::{parse_record_line, DATA_MARKER, DONE_SENTINEL};
