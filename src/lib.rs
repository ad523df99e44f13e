// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! graffiti-kernel: the synchronous core of a threaded comment system that lives
//! on shared-writer (graffiti) feeds.
//!
//! Nothing in this crate performs I/O. It owns the data model, the index codec,
//! message signing and verification, the slot envelope format, reaction
//! snapshot merging and the index arithmetic the node's engine builds on.

pub mod config;
pub mod error;
pub mod types;
pub mod index;
pub mod identity;
pub mod verify;
pub mod snapshot;
pub mod envelope;
pub mod paging;
pub mod sequence;

pub use error::{KernelError, KernelResult};
pub use types::enums::MessageKind;
pub use types::id::{Address, MessageId, SeqIndex};
pub use types::message::{Message, Stamp};
pub use snapshot::ReactionSnapshot;
pub use envelope::EntryPayload;

#[cfg(test)]
pub mod tests;
