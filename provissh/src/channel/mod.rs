//! Interactive channel layer.
//!
//! This module turns the raw shell byte stream into something the engine
//! can reason about: non-blocking chunk reads ([`RemoteShell`]), ANSI
//! stripping, transcript accumulation with idle-window and substring
//! completion detection ([`ResponseCollector`]), and the pluggable
//! [`CompletionPolicy`] implementations.

pub mod ansi;
pub mod collector;
pub mod policy;
pub mod shell;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::{Collected, CollectorConfig, ResponseCollector};
pub use policy::{
    CompletionPolicy, CompletionReason, FirstOf, IdleWindow, PatternMatch, PromptMarker,
};
pub use shell::{LINE_ENDING, RawChunk, RemoteShell};
