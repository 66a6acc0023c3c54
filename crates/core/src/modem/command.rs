//! AT command helpers
//!
//! [`CommandSession`] wraps a [`ModemEngine`] with a timeout and an idle
//! hook and speaks the chip's command dialect. Every helper blocks until the
//! exchange resolves (bounded by the watchdog) and returns the raw status so
//! callers can decide whether to retry.

use core::fmt::Write;

use heapless::String;

use super::engine::{ModemEngine, ModemLink, ModemState, Watchdog};
use super::error::ModemError;
use super::socket::SocketId;
use super::status::ModemStatus;
use super::{COMMAND_CAPACITY, MAX_SEND_PAYLOAD, MAX_SOCKETS};
use crate::traits::SharedState;

type Command = String<COMMAND_CAPACITY>;

/// Blocking command exchanges over one engine
pub struct CommandSession<'e, L, W, S, F>
where
    S: SharedState<ModemState<L, W>>,
{
    engine: &'e ModemEngine<L, W, S>,
    timeout_ms: u32,
    idle: F,
}

impl<'e, L, W, S, F> CommandSession<'e, L, W, S, F>
where
    L: ModemLink,
    W: Watchdog,
    S: SharedState<ModemState<L, W>>,
    F: FnMut(),
{
    /// Session with a per-exchange timeout and an idle hook run while waiting
    pub fn new(engine: &'e ModemEngine<L, W, S>, timeout_ms: u32, idle: F) -> Self {
        Self {
            engine,
            timeout_ms,
            idle,
        }
    }

    /// Engine driven by this session
    pub fn engine(&self) -> &'e ModemEngine<L, W, S> {
        self.engine
    }

    /// Send a command and wait for OK, ERROR or a bit of `expected`.
    fn exchange(&mut self, command: &[u8], expected: ModemStatus) -> Result<ModemStatus, ModemError> {
        self.engine
            .send_command_with(command, expected, self.timeout_ms, &mut self.idle)
    }

    /// Like `exchange`, but a plain OK arriving before `expected` does not
    /// end the wait.
    fn exchange_until(
        &mut self,
        command: &[u8],
        expected: ModemStatus,
    ) -> Result<ModemStatus, ModemError> {
        let status = self.exchange(command, expected)?;
        if status.intersects(expected) || status.is_failure() {
            return Ok(status);
        }
        let pending = self.engine.begin_wait(expected, self.timeout_ms);
        Ok(self.engine.wait(&pending, &mut self.idle))
    }

    /// Plain `AT` liveness probe.
    pub fn probe(&mut self) -> Result<ModemStatus, ModemError> {
        self.exchange(b"AT", ModemStatus::empty())
    }

    /// Restart the chip and wait for it to report ready.
    ///
    /// Sockets, server mode and the cached address are forgotten.
    pub fn reset(&mut self) -> Result<ModemStatus, ModemError> {
        self.engine.reset_state();
        self.exchange_until(b"AT+RST", ModemStatus::READY)
    }

    /// Join an access point for the current session.
    pub fn join_access_point(
        &mut self,
        ssid: &str,
        password: &str,
    ) -> Result<ModemStatus, ModemError> {
        let mut cmd = Command::new();
        write!(cmd, "AT+CWJAP_CUR=\"{}\",\"{}\"", ssid, password)
            .map_err(|_| ModemError::CommandTooLong)?;
        self.exchange(cmd.as_bytes(), ModemStatus::FAIL)
    }

    /// Allow multiple simultaneous connections.
    pub fn enable_multiplex(&mut self) -> Result<ModemStatus, ModemError> {
        self.exchange(b"AT+CIPMUX=1", ModemStatus::empty())
    }

    /// Start a TCP server and enter server mode on success.
    pub fn start_server(&mut self, port: u16) -> Result<ModemStatus, ModemError> {
        let mut cmd = Command::new();
        write!(cmd, "AT+CIPSERVER=1,{}", port).map_err(|_| ModemError::CommandTooLong)?;
        let status = self.exchange(cmd.as_bytes(), ModemStatus::empty())?;
        if status.succeeded() {
            self.engine.set_listening(true);
        }
        Ok(status)
    }

    /// Stop the TCP server; server mode ends regardless of the reply.
    pub fn stop_server(&mut self) -> Result<ModemStatus, ModemError> {
        let status = self.exchange(b"AT+CIPSERVER=0", ModemStatus::empty());
        self.engine.set_listening(false);
        status
    }

    /// Open a TCP client connection on socket `id`.
    pub fn open_socket(
        &mut self,
        id: SocketId,
        host: &str,
        port: u16,
    ) -> Result<ModemStatus, ModemError> {
        check_socket(id)?;
        let mut cmd = Command::new();
        write!(cmd, "AT+CIPSTART={},\"TCP\",\"{}\",{}", id, host, port)
            .map_err(|_| ModemError::CommandTooLong)?;
        self.exchange(cmd.as_bytes(), ModemStatus::CONNECT)
    }

    /// Close socket `id`; the local entry goes away once the chip confirms.
    pub fn close_socket(&mut self, id: SocketId) -> Result<ModemStatus, ModemError> {
        check_socket(id)?;
        let mut cmd = Command::new();
        write!(cmd, "AT+CIPCLOSE={}", id).map_err(|_| ModemError::CommandTooLong)?;
        let status = self.exchange(cmd.as_bytes(), ModemStatus::CLOSED)?;
        if status.intersects(ModemStatus::OK | ModemStatus::CLOSED) {
            self.engine.forget_socket(id);
        }
        Ok(status)
    }

    /// Send `payload` on socket `id`.
    ///
    /// Announces the length, waits for the data prompt, then writes the
    /// payload and waits for `SEND OK`. Without a prompt the announce status
    /// is returned as is.
    pub fn send(&mut self, id: SocketId, payload: &[u8]) -> Result<ModemStatus, ModemError> {
        check_socket(id)?;
        if payload.len() > MAX_SEND_PAYLOAD {
            return Err(ModemError::PayloadTooLarge(payload.len()));
        }

        let mut cmd = Command::new();
        write!(cmd, "AT+CIPSEND={},{}", id, payload.len())
            .map_err(|_| ModemError::CommandTooLong)?;
        let status = self.exchange_until(cmd.as_bytes(), ModemStatus::DATA_PROMPT)?;
        if !status.contains(ModemStatus::DATA_PROMPT) {
            return Ok(status);
        }

        let pending = self
            .engine
            .begin_raw(payload, ModemStatus::SEND_OK, self.timeout_ms)?;
        Ok(self.engine.wait(&pending, &mut self.idle))
    }

    /// Ask the chip for its station address.
    pub fn query_ip(&mut self) -> Result<Option<[u8; 4]>, ModemError> {
        let status = self.exchange(b"AT+CIPSTA_CUR?", ModemStatus::empty())?;
        if status.contains(ModemStatus::IP_ADDRESS) {
            Ok(self.engine.ip_address())
        } else {
            Ok(None)
        }
    }
}

fn check_socket(id: SocketId) -> Result<(), ModemError> {
    if (id as usize) < MAX_SOCKETS {
        Ok(())
    } else {
        Err(ModemError::InvalidSocket(id))
    }
}
