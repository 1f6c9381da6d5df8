//! A small STOMP frame client for poking at brokers.
//!
//! Frames are built as values, written with their NUL terminator, and
//! whatever the broker sends back within a bounded window is handed to the
//! caller as raw bytes. [`decode_frames`] can make sense of those bytes for
//! display, but nothing here drives control flow from them.
//!
//! ```no_run
//! # async fn probe() -> stomp_probe::Result<()> {
//! use std::time::Duration;
//! use stomp_probe::{connect, Frame};
//!
//! let mut conn = connect("127.0.0.1", 7777).await?;
//! conn.send_frame(Frame::connect("example", "u", "p")).await?;
//! let reply = conn.receive_response(Duration::from_millis(500)).await?;
//! println!("{}", String::from_utf8_lossy(&reply));
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```

mod errors;
pub use crate::errors::{Result, StompError};

mod config;
mod connection;
mod parser;
mod protocol;
pub mod script;
mod unparser;

pub use crate::config::ProbeConfig;
pub use crate::connection::{connect, decode_frames, encode, Connection, StompCodec, READ_SIZE};
pub use crate::protocol::{AckMode, Command, Frame, FrameOrKeepAlive, Headers};
