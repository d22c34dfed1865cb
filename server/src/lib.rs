//! # Pong Server Library
//!
//! Authoritative server for room-based two-player Pong. Every room runs its
//! own match; the server owns all physics, scoring and power-up state, and
//! clients only send paddle positions and control requests.
//!
//! ## Architecture
//!
//! ### Single owner of game state
//! All rooms live inside one [`lobby::Lobby`] that is driven from a single
//! task. Client packets and the fixed-rate tick are processed strictly one
//! after another, so no room is ever observed half-updated.
//!
//! ### UDP transport
//! Each datagram carries one `bincode`-encoded [`shared::Packet`]. A client
//! is identified by its source address after its first `JoinRoom`, and is
//! dropped after a period of silence.
//!
//! ### Timers without tasks
//! The recurring power-up cycle of every room is kept in one deadline queue
//! that the tick drains, instead of one sleeping task per room. Restarting a
//! room bumps its epoch so leftovers from the previous cycle are ignored.
//!
//! ## Modules
//!
//! - `game`: ball and paddle physics, scoring, speed ramp, win detection
//! - `room`: seat assignment and the registry of live rooms
//! - `scheduler` / `powerup`: deadline queue and the big-paddle cycle
//! - `lobby`: join, move, pause, restart, disconnect and the per-tick update
//! - `client_manager`: address to client id mapping and timeouts
//! - `network`: socket tasks and the main loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         bind_addr: "0.0.0.0:8080".to_string(),
//!         ..ServerConfig::default()
//!     };
//!
//!     let mut server = Server::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod error;
pub mod game;
pub mod lobby;
pub mod network;
pub mod powerup;
pub mod room;
pub mod scheduler;
