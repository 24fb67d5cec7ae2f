//! Wire protocol for the linkstore message-store client.
//!
//! This crate provides the command grammar, the envelope framing and the
//! diagnostic row types. It has no I/O; the connection and navigation engine
//! lives in `linkstore-client`.
//!
//! The protocol carries no request identifiers. A reply can only be matched to
//! the command that caused it by its shape, so several in-flight commands of
//! the same kind are indistinguishable.

mod command;
mod diagnostics;
mod envelope;

pub use command::{hex_to_bits, Command, CommandParseError, Direction, Format};
pub use diagnostics::{
    sort_free_space_rows, sort_index_rows, FreeSpaceColumn, FreeSpaceRow, IndexColumn, IndexRow,
};
pub use envelope::{
    ClientEnvelope, DecodeError, LinkLists, MessageRef, MessageResponse, PassThroughAction,
    ServerEnvelope,
};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Frames may be sent.
    Open,
    /// Socket gone; a reconnect is pending.
    Closed,
}
