//! Talon Core
//!
//! Storage and authorization core for a game-server panel chat bot:
//! per-user panel credentials encrypted at rest, a guild capability model
//! with an admin-role override, and an append-only audit trail, all backed
//! by `PostgreSQL`. The chat-platform command layer is an external consumer
//! of this crate.

pub mod audit;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod db;
pub mod error;
pub mod guild;
pub mod permissions;
pub mod servers;
