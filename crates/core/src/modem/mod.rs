//! WiFi modem protocol engine
//!
//! Drives an AT-command WiFi chip over a byte-serial link. Commands go out
//! from the main loop; responses come back through the receive interrupt,
//! which accumulates bytes, detects frame boundaries and runs the response
//! parser. Inbound socket data is never handled inside the interrupt: the
//! parser stores it in the socket table and the interrupt handler queues a
//! deferred `RECEIVE` task on the scheduler.
//!
//! # Components
//!
//! - [`status`]: Response status bitmask and token vocabulary
//! - [`socket`]: Socket/client table fed by connection events
//! - [`parser`]: Frame detection and response parsing
//! - [`engine`]: Command/response state machine and interrupt handlers
//! - [`command`]: AT command helpers (join, server, open, send, ...)
//! - [`module`]: Kernel module serving deferred socket tasks
//! - [`mock`]: Scripted link and watchdog for host testing

pub mod command;
pub mod engine;
pub mod error;
pub mod mock;
pub mod module;
pub mod parser;
pub mod socket;
pub mod status;

pub use command::CommandSession;
pub use engine::{ModemEngine, ModemLink, ModemPhase, ModemState, ModemStats, PendingCommand, Watchdog};
pub use error::ModemError;
pub use module::{ModemModule, SocketListener};
pub use parser::{frame_complete, parse_response, ParseOutcome};
pub use socket::{Socket, SocketId, SocketTable};
pub use status::ModemStatus;

/// Maximum simultaneous connections the chip supports
pub const MAX_SOCKETS: usize = 5;

/// Per-socket inbound buffer size in bytes
pub const SOCKET_RX_CAPACITY: usize = 512;

/// Receive line buffer size in bytes
pub const LINE_BUFFER_SIZE: usize = 1024;

/// Maximum formatted AT command length
pub const COMMAND_CAPACITY: usize = 128;

/// Largest payload a single `AT+CIPSEND` accepts
pub const MAX_SEND_PAYLOAD: usize = 2048;

/// Op codes understood by [`ModemModule`]
pub mod ops {
    use crate::scheduler::OpCode;

    /// Drain a socket's response buffer to the listener. Args: `[socket]`
    pub const RECEIVE: OpCode = 0;
    /// Send bytes on a socket. Args: `[socket, payload...]`
    pub const SEND: OpCode = 1;
    /// Open a TCP client socket unless already alive.
    /// Args: `[socket, port_hi, port_lo, host...]`
    pub const OPEN: OpCode = 2;
    /// Close a socket. Args: `[socket]`
    pub const CLOSE: OpCode = 3;
}
