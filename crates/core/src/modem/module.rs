//! Modem kernel module
//!
//! Serves the deferred socket tasks the receive interrupt queues, plus
//! socket operations other modules request through the scheduler.

use super::command::CommandSession;
use super::engine::{ModemEngine, ModemLink, ModemState, Watchdog};
use super::error::ModemError;
use super::ops;
use super::socket::SocketId;
use super::status::ModemStatus;
use crate::scheduler::{KernelModule, TaskContext, TaskMessage, TaskOutcome};
use crate::traits::SharedState;

/// Task arguments were missing or malformed
pub const ERR_BAD_ARGS: u8 = 1;
/// The link rejected a write or the command did not fit
pub const ERR_LINK: u8 = 2;
/// The chip answered ERROR or FAIL
pub const ERR_REJECTED: u8 = 3;
/// Unknown op code
pub const ERR_UNKNOWN_OP: u8 = 4;

/// Consumer of inbound socket data
pub trait SocketListener {
    /// Called from the main loop with the bytes buffered for `socket`.
    fn on_data(&self, socket: SocketId, data: &[u8]);
}

/// Kernel module wrapping a modem engine
///
/// `idle` runs while a blocking exchange waits; on target a spin hint is
/// enough since the interrupts resolve the exchange.
pub struct ModemModule<'e, L, W, S, H, I>
where
    S: SharedState<ModemState<L, W>>,
{
    engine: &'e ModemEngine<L, W, S>,
    listener: H,
    timeout_ms: u32,
    idle: I,
}

impl<'e, L, W, S, H, I> ModemModule<'e, L, W, S, H, I>
where
    L: ModemLink,
    W: Watchdog,
    S: SharedState<ModemState<L, W>>,
    H: SocketListener,
    I: Fn(),
{
    /// Module over `engine`, delivering inbound data to `listener`
    pub fn new(engine: &'e ModemEngine<L, W, S>, listener: H, timeout_ms: u32, idle: I) -> Self {
        Self {
            engine,
            listener,
            timeout_ms,
            idle,
        }
    }

    fn session(&self) -> CommandSession<'e, L, W, S, &I> {
        CommandSession::new(self.engine, self.timeout_ms, &self.idle)
    }

    fn receive(&self, args: &[u8]) -> TaskOutcome {
        let &[socket] = args else {
            return TaskOutcome::Failed(ERR_BAD_ARGS);
        };
        // Already drained by an earlier task: nothing to do
        if let Some(data) = self.engine.take_response(socket) {
            self.listener.on_data(socket, &data);
        }
        TaskOutcome::Done
    }

    fn send(&self, args: &[u8]) -> TaskOutcome {
        let Some((&socket, payload)) = args.split_first() else {
            return TaskOutcome::Failed(ERR_BAD_ARGS);
        };
        outcome(self.session().send(socket, payload))
    }

    fn open(&self, args: &[u8]) -> TaskOutcome {
        let [socket, port_hi, port_lo, host @ ..] = args else {
            return TaskOutcome::Failed(ERR_BAD_ARGS);
        };
        if self.engine.is_socket_alive(*socket) {
            return TaskOutcome::Done;
        }
        let Ok(host) = core::str::from_utf8(host) else {
            return TaskOutcome::Failed(ERR_BAD_ARGS);
        };
        let port = u16::from_be_bytes([*port_hi, *port_lo]);
        let result = self.session().open_socket(*socket, host, port);
        if result.is_ok_and(|status| status.succeeded()) {
            self.engine.set_keep_alive(*socket, true);
        }
        outcome(result)
    }

    fn close(&self, args: &[u8]) -> TaskOutcome {
        let &[socket] = args else {
            return TaskOutcome::Failed(ERR_BAD_ARGS);
        };
        outcome(self.session().close_socket(socket))
    }
}

/// Map an exchange result onto a task outcome.
fn outcome(result: Result<ModemStatus, ModemError>) -> TaskOutcome {
    match result {
        Ok(status) if status.contains(ModemStatus::TIMEOUT) => TaskOutcome::Hung,
        Ok(status) if status.is_failure() => TaskOutcome::Failed(ERR_REJECTED),
        Ok(_) => TaskOutcome::Done,
        Err(ModemError::InvalidSocket(_) | ModemError::PayloadTooLarge(_)) => {
            TaskOutcome::Failed(ERR_BAD_ARGS)
        }
        Err(_) => TaskOutcome::Failed(ERR_LINK),
    }
}

impl<'e, L, W, S, H, I> KernelModule for ModemModule<'e, L, W, S, H, I>
where
    L: ModemLink,
    W: Watchdog,
    S: SharedState<ModemState<L, W>>,
    H: SocketListener,
    I: Fn(),
{
    fn on_task(&self, msg: TaskMessage<'_>, _tasks: &dyn TaskContext) -> TaskOutcome {
        match msg.op_code {
            ops::RECEIVE => self.receive(msg.args),
            ops::SEND => self.send(msg.args),
            ops::OPEN => self.open(msg.args),
            ops::CLOSE => self.close(msg.args),
            _ => TaskOutcome::Failed(ERR_UNKNOWN_OP),
        }
    }

    fn name(&self) -> &'static str {
        "modem"
    }
}
