//! Control plane for the script gateway.
//!
//! A chat transport turns each inbound message into a [`Command`] and hands
//! it, together with the authenticated sender id, to a [`CommandHandler`].
//! [`ControlPlane`] is the single implementation; it talks to the registry
//! and the store directly and to the gateway over HTTP through a
//! [`GatewayClient`].

pub mod client;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod present;

pub use client::{GatewayClient, HttpGatewayClient};
pub use command::{parse_command, Command};
pub use dispatch::{CommandHandler, ControlPlane, ControlReply, ControlSettings};
pub use error::ControlError;
