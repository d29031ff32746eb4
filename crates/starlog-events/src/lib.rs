//! Journal event model and line parser for the Starlog journal engine.
//!
//! The running game appends one JSON object per line to its journal
//! files. This crate turns a raw line into a typed [`JournalEvent`]:
//! a timestamp, a recognized [`EventKind`] (or [`EventKind::Unknown`] for
//! kinds this version does not know, which keeps the engine forward
//! compatible), and the untyped payload map.
//!
//! Parsing never fails loudly: [`parse_line`] returns `None` for anything
//! that is not a well-formed journal line, and the caller drops the line
//! and moves on.

pub mod event;
pub mod kind;
pub mod parser;

pub use event::JournalEvent;
pub use kind::EventKind;
pub use parser::parse_line;
