//! Remote access for TreeFS trees.
//!
//! The client side ([`RemoteFs`], [`RemoteFolder`], [`RemoteFile`])
//! presents the same contract as a local tree and forwards every call
//! through one-connection-per-call round trips. The server side
//! ([`Server`]) decodes requests, routes them to the authoritative
//! [`treefs_core::FileSystem`], and survives any single bad request.

mod client;
mod connector;
mod server;

pub use client::{RemoteFile, RemoteFolder, RemoteFs};
pub use connector::Connector;
pub use server::Server;
