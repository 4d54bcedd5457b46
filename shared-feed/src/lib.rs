//! Shared, append-only message feed behind a single serializing worker.
//!
//! Every read and write goes through one task that owns the feed, so callers
//! never manage locks. Each module focuses on a concrete responsibility:
//!
//! - [`feed`] holds the ordered message history with no concurrency awareness.
//! - [`access_point`] spawns the worker that owns the feed and hands out
//!   cloneable handles exposing `post` and `get`.
//! - [`error`] lists the errors the access point reports to callers.
//! - [`message`] provides the JSON line protocol plus async read/write helpers.
//! - [`server`] accepts TCP connections and translates requests into feed calls.
//! - [`http`] exposes the same two operations over HTTP.
//! - [`client`] talks to a running server over TCP.
//! - [`protocol`] parses shell commands such as `post <text>` and `get [n]`.
//! - [`shell`] runs parsed commands against a local or remote feed.
//! - [`cli`] parses the command-line interface.

pub mod access_point;
pub mod cli;
pub mod client;
pub mod error;
pub mod feed;
pub mod http;
pub mod message;
pub mod protocol;
pub mod server;
pub mod shell;
