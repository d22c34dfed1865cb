//! Error types for the pong server.

use crate::room::ClientId;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("invalid address: {0}")]
    InvalidAddr(String),
}

/// Why a client request was ignored. Never sent to the client; only logged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LobbyError {
    #[error("room {0} does not exist")]
    UnknownRoom(String),

    #[error("client {client_id} is not in room {room}")]
    NotInRoom { client_id: ClientId, room: String },

    #[error("client {0} is a spectator")]
    Spectator(ClientId),

    #[error("paddle position is not a number")]
    InvalidPosition,
}
