//! Request-dispatch core of the zls language server.
//!
//! The crate consumes a bidirectional stream of JSON-RPC 2.0 frames, routes
//! each message to a typed handler according to the protocol lifecycle, and
//! queues correlated replies for the transport. Analysis itself lives behind
//! the collaborator seams in [`providers`]; this crate is the kernel that
//! decodes, gates, dispatches, and answers.
//!
//! One logical thread drives the whole pipeline: read a frame, run
//! [`server::Server::process_message`], drain [`server::Server::outbound`].
//! Ordering between inbound and outbound messages is strictly sequential
//! per arrival.

pub mod capabilities;
pub mod configuration;
mod dispatch;
pub mod error;
mod handlers;
pub mod jsonrpc;
pub mod lifecycle;
pub mod outbound;
pub mod providers;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod transport;

pub use server::{AutofixMode, Server, ServerOptions};
