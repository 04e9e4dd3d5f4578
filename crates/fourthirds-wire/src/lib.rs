//! Lens packet wire format.
//!
//! Packets exchanged between a camera body and a lens are framed as a
//! one-byte count, the payload bytes, and a one-byte checksum trailer:
//!
//! | Field    | Size (bytes) | Description                                  |
//! |----------|--------------|----------------------------------------------|
//! | count    | 1            | Number of payload bytes (checksum excluded). |
//! | payload  | 1..=255      | The data being transmitted.                  |
//! | checksum | 1            | Unsigned 8-bit sum of the payload bytes.     |
//!
//! The count byte is not included in the checksum. This crate is the pure
//! data model: checksum arithmetic, encoding to wire bytes, and an offline
//! parser for captured traffic. It performs no I/O; the live handshake
//! lives in `lenssim-lens`.

mod constants;
mod error;
mod packet;

pub use constants::*;
pub use error::*;
pub use packet::*;
