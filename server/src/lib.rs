//! Relay Server - Real-time message relay.
//!
//! This crate provides a WebSocket chat relay, responsible for:
//! - Authenticating clients with a shared secret
//! - Tracking who is connected and under what display name
//! - Fanning chat messages and presence announcements out to every
//!   connected client
//!
//! # Architecture
//!
//! A listener accepts connections and runs one session task per client. All
//! sessions share a single connection registry, the source of truth for
//! membership and the fan-out primitive for broadcasts. Messages are relayed
//! in real time without persistent storage.

pub mod auth;
pub mod config;
pub mod error;
pub mod registry;
pub mod routes;
pub mod session;
pub mod types;
