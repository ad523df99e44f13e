// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod config;
pub mod errors;
pub mod retry;
pub mod telemetry;
pub mod events;
pub mod store;
pub mod network;
pub mod context;
pub mod tracker;
pub mod verifier;
pub mod reactions;
pub mod history;
pub mod session;
pub mod poll;
pub mod engine;
pub mod server;

pub use engine::{CommentEngine, SendRequest};
pub use errors::{EngineError, EngineResult};
pub use events::CommentEvent;
