//! Modem command/response state machine
//!
//! ```text
//! Idle --begin_command--> CommandSent --bytes--> AwaitingTerminator
//!   ^                                                  |
//!   +------------- next command ---- Parsed(status) <--+ terminal token
//! ```
//!
//! Server mode (`listening`) runs in parallel: while it is set, the receive
//! interrupt stays enabled after a terminal status so unsolicited
//! connection events and data keep arriving.
//!
//! The status word is an atomic so the main loop can poll it without taking
//! the lock; it is only written inside the lock.

use core::marker::PhantomData;
use core::sync::atomic::{AtomicU32, Ordering};

use heapless::Vec;

use super::error::ModemError;
use super::parser::{frame_complete, parse_response};
use super::socket::{SocketId, SocketTable};
use super::status::{ModemStatus, IPD_TOKEN};
use super::{ops, LINE_BUFFER_SIZE, MAX_SOCKETS, SOCKET_RX_CAPACITY};
use crate::scheduler::{module_ids, TaskContext};
use crate::traits::SharedState;

/// Byte-serial link to the modem chip
///
/// Implemented by the firmware over a UART; every method is called with the
/// modem lock held, so implementations must not block.
pub trait ModemLink {
    /// Transmit bytes.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ModemError>;

    /// Next received byte, if one is waiting.
    fn read_byte(&mut self) -> Option<u8>;

    /// Drop any bytes already received.
    fn discard_input(&mut self);

    /// Enable or disable the receive interrupt.
    fn set_rx_interrupt(&mut self, enabled: bool);

    /// Mark the receive interrupt pending so its handler runs once more.
    fn pend_rx_interrupt(&mut self);
}

/// Hardware timer that aborts a hung exchange
///
/// When an armed watchdog expires, the platform calls
/// [`ModemEngine::on_watchdog_timeout`] exactly once.
pub trait Watchdog {
    /// Start (or restart) the countdown.
    fn arm(&mut self, timeout_ms: u32);

    /// Stop the countdown.
    fn disarm(&mut self);
}

/// Command exchange phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModemPhase {
    /// No command outstanding
    #[default]
    Idle,
    /// Command written, nothing received yet
    CommandSent,
    /// Response bytes arriving
    AwaitingTerminator,
    /// A terminal status was reached
    Parsed(ModemStatus),
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModemStats {
    /// Commands and raw payloads written
    pub commands_sent: u32,
    /// Watchdog expiries
    pub timeouts: u32,
    /// Parser runs
    pub frames_parsed: u32,
    /// Parser runs triggered by a watchdog expiry
    pub forced_parses: u32,
    /// Line buffer filled before a frame completed
    pub line_overflows: u32,
    /// Payload bytes dropped because a socket buffer was full
    pub payload_truncated: u32,
    /// Deferred `RECEIVE` tasks that could not be queued
    pub deferred_failed: u32,
}

/// A command waiting for its terminal status
///
/// Returned by [`ModemEngine::begin_command`]; resolve it with
/// [`ModemEngine::poll_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct PendingCommand {
    terminal: ModemStatus,
}

impl PendingCommand {
    /// Flags that resolve this command
    pub fn terminal(&self) -> ModemStatus {
        self.terminal
    }
}

/// Lock-protected modem state
pub struct ModemState<L, W> {
    link: L,
    watchdog: W,
    line: Vec<u8, LINE_BUFFER_SIZE>,
    ipd_in_line: bool,
    /// Payload bytes of an oversized `+IPD` frame still to route
    passthrough: Option<(SocketId, usize)>,
    sockets: SocketTable,
    ip: Option<[u8; 4]>,
    phase: ModemPhase,
    listening: bool,
    force_parse: bool,
    terminal: ModemStatus,
    stats: ModemStats,
}

impl<L: ModemLink, W: Watchdog> ModemState<L, W> {
    /// Fresh state over a link and a watchdog
    pub const fn new(link: L, watchdog: W) -> Self {
        Self {
            link,
            watchdog,
            line: Vec::new(),
            ipd_in_line: false,
            passthrough: None,
            sockets: SocketTable::new(),
            ip: None,
            phase: ModemPhase::Idle,
            listening: false,
            force_parse: false,
            terminal: ModemStatus::TERMINAL,
            stats: ModemStats {
                commands_sent: 0,
                timeouts: 0,
                frames_parsed: 0,
                forced_parses: 0,
                line_overflows: 0,
                payload_truncated: 0,
                deferred_failed: 0,
            },
        }
    }

    /// Underlying link
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Underlying watchdog
    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    /// Socket table
    pub fn sockets(&self) -> &SocketTable {
        &self.sockets
    }

    fn clear_line(&mut self) {
        self.line.clear();
        self.ipd_in_line = false;
    }

    /// Parse the line buffer and reset it; returns flags and sockets with data.
    fn parse_line(&mut self) -> (ModemStatus, Vec<SocketId, MAX_SOCKETS>) {
        let outcome = parse_response(&self.line, &mut self.sockets, &mut self.ip);
        self.stats.frames_parsed = self.stats.frames_parsed.wrapping_add(1);
        self.stats.payload_truncated = self
            .stats
            .payload_truncated
            .saturating_add(outcome.truncated as u32);
        self.passthrough = outcome.unfinished;
        self.clear_line();
        (outcome.status, outcome.received)
    }

    /// Store one payload byte of an oversized frame without scanning it.
    fn pass_through(&mut self, byte: u8) {
        let Some((id, left)) = self.passthrough else {
            return;
        };
        if let Ok(dropped) = self.sockets.store_payload(id, &[byte]) {
            self.stats.payload_truncated =
                self.stats.payload_truncated.saturating_add(dropped as u32);
        }
        self.passthrough = (left > 1).then_some((id, left - 1));
    }
}

/// Fold one parser run into the interrupt's running totals.
fn absorb(
    (found, sockets): (ModemStatus, Vec<SocketId, MAX_SOCKETS>),
    flags: &mut ModemStatus,
    received: &mut Vec<SocketId, MAX_SOCKETS>,
) {
    *flags |= found;
    for id in sockets {
        if !received.contains(&id) {
            // One slot per socket id
            let _ = received.push(id);
        }
    }
}

/// Interrupt-driven AT command engine
///
/// Owns nothing global: the firmware constructs one instance and hands
/// references to the receive and watchdog interrupt handlers.
pub struct ModemEngine<L, W, S>
where
    S: SharedState<ModemState<L, W>>,
{
    state: S,
    status: AtomicU32,
    _marker: PhantomData<fn() -> (L, W)>,
}

impl<L, W, S> ModemEngine<L, W, S>
where
    L: ModemLink,
    W: Watchdog,
    S: SharedState<ModemState<L, W>>,
{
    /// Wrap existing modem state.
    pub const fn new(state: S) -> Self {
        Self {
            state,
            status: AtomicU32::new(0),
            _marker: PhantomData,
        }
    }

    /// Status flags accumulated for the current exchange
    pub fn status(&self) -> ModemStatus {
        ModemStatus::from_bits_truncate(self.status.load(Ordering::Acquire))
    }

    /// Must be called with the lock held (single writer).
    fn merge_status(&self, flags: ModemStatus) -> ModemStatus {
        let merged = self.status() | flags;
        self.status.store(merged.bits(), Ordering::Release);
        merged
    }

    /// Start a command exchange.
    ///
    /// Flushes stale input, writes `command` followed by CR-LF, arms the
    /// watchdog and enables the receive interrupt. The command resolves when
    /// the status holds OK, ERROR or any bit of `expected`.
    ///
    /// # Errors
    ///
    /// Returns `ModemError::Link` if the link rejects the write; the
    /// watchdog is not armed in that case.
    pub fn begin_command(
        &self,
        command: &[u8],
        expected: ModemStatus,
        timeout_ms: u32,
    ) -> Result<PendingCommand, ModemError> {
        self.start_exchange(command, true, ModemStatus::TERMINAL | expected, timeout_ms)
    }

    /// Start a raw write (payload after a data prompt), without CR-LF.
    ///
    /// Unlike a command, a plain OK does not resolve it: only a failure flag
    /// or a bit of `expected` does.
    pub fn begin_raw(
        &self,
        bytes: &[u8],
        expected: ModemStatus,
        timeout_ms: u32,
    ) -> Result<PendingCommand, ModemError> {
        self.start_exchange(bytes, false, ModemStatus::FAILURE | expected, timeout_ms)
    }

    /// Keep waiting for `expected` after an earlier terminator (e.g. READY
    /// after the OK of a reset). Flags already received that match
    /// `expected` resolve it immediately.
    pub fn begin_wait(&self, expected: ModemStatus, timeout_ms: u32) -> PendingCommand {
        let terminal = ModemStatus::FAILURE | expected;
        self.state.with_mut(|state| {
            // Drop OK so the next poll does not resolve on it again
            let status = self.status() - ModemStatus::OK;
            self.status.store(status.bits(), Ordering::Release);
            state.terminal = terminal;
            state.phase = ModemPhase::AwaitingTerminator;
            state.watchdog.arm(timeout_ms);
            state.link.set_rx_interrupt(true);
        });
        PendingCommand { terminal }
    }

    fn start_exchange(
        &self,
        bytes: &[u8],
        terminate: bool,
        terminal: ModemStatus,
        timeout_ms: u32,
    ) -> Result<PendingCommand, ModemError> {
        self.state.with_mut(|state| {
            state.link.discard_input();
            state.clear_line();
            state.passthrough = None;
            state.force_parse = false;
            self.status.store(0, Ordering::Release);

            state.link.write(bytes)?;
            if terminate {
                state.link.write(b"\r\n")?;
            }
            state.stats.commands_sent = state.stats.commands_sent.wrapping_add(1);

            state.terminal = terminal;
            state.phase = ModemPhase::CommandSent;
            state.watchdog.arm(timeout_ms);
            state.link.set_rx_interrupt(true);
            Ok(PendingCommand { terminal })
        })
    }

    /// Status once the command has resolved, `None` while still waiting.
    pub fn poll_command(&self, pending: &PendingCommand) -> Option<ModemStatus> {
        let status = self.status();
        status.intersects(pending.terminal).then_some(status)
    }

    /// Send a command and block until it resolves, calling `idle` between polls.
    ///
    /// Bounded by the watchdog: a missing terminator resolves with ERROR and
    /// TIMEOUT once the watchdog fires.
    pub fn send_command_with<F: FnMut()>(
        &self,
        command: &[u8],
        expected: ModemStatus,
        timeout_ms: u32,
        idle: F,
    ) -> Result<ModemStatus, ModemError> {
        let pending = self.begin_command(command, expected, timeout_ms)?;
        Ok(self.wait(&pending, idle))
    }

    /// [`send_command_with`](Self::send_command_with) with a spin hint as idle.
    pub fn send_command(
        &self,
        command: &[u8],
        expected: ModemStatus,
        timeout_ms: u32,
    ) -> Result<ModemStatus, ModemError> {
        self.send_command_with(command, expected, timeout_ms, core::hint::spin_loop)
    }

    /// Block until `pending` resolves.
    pub fn wait<F: FnMut()>(&self, pending: &PendingCommand, mut idle: F) -> ModemStatus {
        loop {
            if let Some(status) = self.poll_command(pending) {
                return status;
            }
            idle();
        }
    }

    /// Receive interrupt handler.
    ///
    /// Drains the link into the line buffer, parses every complete frame and
    /// queues a deferred `RECEIVE` task per socket that got data (when a
    /// scheduler is available). Returns the accumulated status.
    pub fn on_rx_interrupt(&self, tasks: Option<&dyn TaskContext>) -> ModemStatus {
        let mut received: Vec<SocketId, MAX_SOCKETS> = Vec::new();

        let status = self.state.with_mut(|state| {
            let mut flags = ModemStatus::empty();

            while let Some(byte) = state.link.read_byte() {
                if state.phase == ModemPhase::CommandSent {
                    state.phase = ModemPhase::AwaitingTerminator;
                }

                if state.passthrough.is_some() {
                    state.pass_through(byte);
                    continue;
                }

                if state.line.push(byte).is_err() {
                    // Full without a terminator: parse what we have and start over
                    state.stats.line_overflows = state.stats.line_overflows.wrapping_add(1);
                    absorb(state.parse_line(), &mut flags, &mut received);
                    if state.passthrough.is_some() {
                        state.pass_through(byte);
                        continue;
                    }
                    let _ = state.line.push(byte);
                }
                if state.line.ends_with(IPD_TOKEN) {
                    state.ipd_in_line = true;
                }

                let boundary = matches!(byte, b'\n' | b' ') || state.ipd_in_line;
                if boundary && frame_complete(&state.line) {
                    absorb(state.parse_line(), &mut flags, &mut received);
                }
            }

            if state.force_parse {
                state.force_parse = false;
                state.stats.forced_parses = state.stats.forced_parses.wrapping_add(1);
                if !state.line.is_empty() {
                    absorb(state.parse_line(), &mut flags, &mut received);
                }
                state.passthrough = None;
            }

            let status = self.merge_status(flags);
            if status.intersects(state.terminal) {
                state.phase = ModemPhase::Parsed(status);
                state.watchdog.disarm();
            }
            if status.intersects(ModemStatus::TERMINAL) && !state.listening {
                state.link.set_rx_interrupt(false);
            }
            status
        });

        if let Some(tasks) = tasks {
            for id in received {
                let queued = tasks.schedule_with_args(
                    module_ids::MODEM,
                    ops::RECEIVE,
                    0,
                    false,
                    0,
                    &[id],
                );
                if queued.is_err() {
                    self.state.with_mut(|state| {
                        state.stats.deferred_failed = state.stats.deferred_failed.wrapping_add(1)
                    });
                }
            }
        }

        status
    }

    /// Watchdog interrupt handler.
    ///
    /// Forces ERROR (and TIMEOUT) into the status word and re-triggers the
    /// receive interrupt so the parser runs once more over partial input.
    pub fn on_watchdog_timeout(&self) {
        self.state.with_mut(|state| self.expire(state));
    }

    /// Fire [`on_watchdog_timeout`](Self::on_watchdog_timeout) if `expired`
    /// reports the countdown ran out.
    ///
    /// The check and the expiry share one lock, so a response that disarms
    /// the watchdog in between cannot be overwritten by a stale timeout.
    pub fn on_watchdog_timeout_if<F>(&self, expired: F) -> bool
    where
        F: FnOnce(&W) -> bool,
    {
        self.state.with_mut(|state| {
            if !expired(&state.watchdog) {
                return false;
            }
            self.expire(state);
            true
        })
    }

    fn expire(&self, state: &mut ModemState<L, W>) {
        state.stats.timeouts = state.stats.timeouts.wrapping_add(1);
        state.force_parse = true;
        state.watchdog.disarm();
        self.merge_status(ModemStatus::ERROR | ModemStatus::TIMEOUT);
        state.link.pend_rx_interrupt();
    }

    /// Current exchange phase
    pub fn phase(&self) -> ModemPhase {
        self.state.with(|state| state.phase)
    }

    /// Last IP address reported by the chip
    pub fn ip_address(&self) -> Option<[u8; 4]> {
        self.state.with(|state| state.ip)
    }

    /// Whether server mode is active
    pub fn is_listening(&self) -> bool {
        self.state.with(|state| state.listening)
    }

    /// Enter or leave server mode.
    pub fn set_listening(&self, listening: bool) {
        self.state.with_mut(|state| {
            state.listening = listening;
            if listening {
                state.link.set_rx_interrupt(true);
            }
        });
    }

    /// Whether a socket is open
    pub fn is_socket_alive(&self, id: SocketId) -> bool {
        self.state.with(|state| state.sockets.is_alive(id))
    }

    /// Move a socket's buffered inbound data out.
    pub fn take_response(&self, id: SocketId) -> Option<Vec<u8, SOCKET_RX_CAPACITY>> {
        self.state.with_mut(|state| state.sockets.take_response(id))
    }

    /// Mark a socket for automatic re-opening.
    pub fn set_keep_alive(&self, id: SocketId, keep_alive: bool) -> bool {
        self.state
            .with_mut(|state| state.sockets.set_keep_alive(id, keep_alive))
    }

    /// Drop a socket entry without talking to the chip.
    pub fn forget_socket(&self, id: SocketId) -> bool {
        self.state.with_mut(|state| state.sockets.close(id))
    }

    /// Forget all sockets and server mode (after a chip reset).
    pub fn reset_state(&self) {
        self.state.with_mut(|state| {
            state.sockets.clear();
            state.passthrough = None;
            state.listening = false;
            state.ip = None;
            state.phase = ModemPhase::Idle;
        });
    }

    /// Diagnostic counters
    pub fn stats(&self) -> ModemStats {
        self.state.with(|state| state.stats)
    }

    /// Run `f` with exclusive access to the link.
    pub fn with_link<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut L) -> R,
    {
        self.state.with_mut(|state| f(&mut state.link))
    }

    /// Run `f` against the locked state, for diagnostics.
    pub fn inspect<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ModemState<L, W>) -> R,
    {
        self.state.with(f)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::modem::mock::{MockLink, MockWatchdog};
    use crate::traits::MockState;

    type TestEngine = ModemEngine<MockLink, MockWatchdog, MockState<ModemState<MockLink, MockWatchdog>>>;

    fn engine() -> TestEngine {
        ModemEngine::new(MockState::new(ModemState::new(
            MockLink::new(),
            MockWatchdog::new(),
        )))
    }

    fn feed(engine: &TestEngine, bytes: &[u8]) -> ModemStatus {
        engine.with_link(|link| link.inject(bytes));
        engine.on_rx_interrupt(None)
    }

    #[test]
    fn test_begin_command_writes_and_arms() {
        let engine = engine();
        engine.with_link(|link| link.inject(b"stale"));

        let pending = engine.begin_command(b"AT", ModemStatus::empty(), 500).unwrap();
        assert_eq!(engine.phase(), ModemPhase::CommandSent);
        assert!(engine.poll_command(&pending).is_none());

        engine.inspect(|state| {
            assert_eq!(state.link().tx(), b"AT\r\n");
            assert!(state.link().rx_enabled());
            assert_eq!(state.link().pending_rx(), 0);
            assert_eq!(state.watchdog().armed(), Some(500));
        });
        assert_eq!(engine.stats().commands_sent, 1);
    }

    #[test]
    fn test_ok_resolves_and_disables_rx() {
        let engine = engine();
        let pending = engine.begin_command(b"AT", ModemStatus::empty(), 500).unwrap();

        feed(&engine, b"AT\r\n");
        assert_eq!(engine.phase(), ModemPhase::AwaitingTerminator);
        assert!(engine.poll_command(&pending).is_none());

        feed(&engine, b"\r\nOK\r\n");
        assert_eq!(engine.poll_command(&pending), Some(ModemStatus::OK));
        assert_eq!(engine.phase(), ModemPhase::Parsed(ModemStatus::OK));
        engine.inspect(|state| {
            assert!(!state.link().rx_enabled());
            assert_eq!(state.watchdog().armed(), None);
        });
    }

    #[test]
    fn test_expected_flag_resolves() {
        let engine = engine();
        let pending = engine
            .begin_command(b"AT+CIPSEND=0,4", ModemStatus::DATA_PROMPT, 500)
            .unwrap();
        feed(&engine, b"> ");
        assert_eq!(engine.poll_command(&pending), Some(ModemStatus::DATA_PROMPT));
    }

    #[test]
    fn test_prompt_after_ok_in_one_burst() {
        let engine = engine();
        let pending = engine
            .begin_command(b"AT+CIPSEND=0,4", ModemStatus::DATA_PROMPT, 500)
            .unwrap();
        let status = feed(&engine, b"\r\nOK\r\n> ");

        assert!(status.contains(ModemStatus::OK | ModemStatus::DATA_PROMPT));
        assert!(engine
            .poll_command(&pending)
            .unwrap()
            .contains(ModemStatus::DATA_PROMPT));
    }

    #[test]
    fn test_listening_keeps_rx_enabled() {
        let engine = engine();
        engine.set_listening(true);
        let pending = engine.begin_command(b"AT", ModemStatus::empty(), 500).unwrap();
        feed(&engine, b"OK\r\n");

        assert!(engine.poll_command(&pending).is_some());
        assert!(engine.inspect(|state| state.link().rx_enabled()));
    }

    #[test]
    fn test_watchdog_forces_error_and_parse() {
        let engine = engine();
        let pending = engine.begin_command(b"AT+RST", ModemStatus::READY, 1000).unwrap();

        // Partial line without terminator
        engine.with_link(|link| link.inject(b"WIFI CONNECTED"));
        engine.on_watchdog_timeout();
        assert_eq!(engine.inspect(|state| state.link().pend_count()), 1);

        let status = engine.on_rx_interrupt(None);
        assert!(status.contains(ModemStatus::ERROR | ModemStatus::TIMEOUT));
        assert!(status.contains(ModemStatus::WIFI_CONNECTED));
        assert!(engine.poll_command(&pending).unwrap().is_failure());

        let stats = engine.stats();
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.forced_parses, 1);
    }

    #[test]
    fn test_conditional_timeout_checks_watchdog() {
        let engine = engine();
        assert!(!engine.on_watchdog_timeout_if(|watchdog| watchdog.armed().is_some()));

        let _pending = engine.begin_command(b"AT", ModemStatus::empty(), 500).unwrap();
        assert!(engine.on_watchdog_timeout_if(|watchdog| watchdog.armed() == Some(500)));
        // Disarmed by the expiry itself
        assert!(!engine.on_watchdog_timeout_if(|watchdog| watchdog.armed().is_some()));
        assert_eq!(engine.stats().timeouts, 1);
    }

    #[test]
    fn test_ipd_queues_deferred_receive() {
        use crate::scheduler::{Scheduler, SchedulerState};
        use crate::traits::TimeBase;

        let time = TimeBase::new(100);
        let scheduler = Scheduler::new(MockState::new(SchedulerState::new()), &time);
        let engine = engine();
        engine.set_listening(true);

        engine.with_link(|link| link.inject(b"0,CONNECT\r\n+IPD,0,5:hello"));
        let status = engine.on_rx_interrupt(Some(&scheduler));

        assert!(status.contains(ModemStatus::CONNECT | ModemStatus::IPD));
        assert_eq!(scheduler.pending_tasks(), 1);
        assert!(scheduler.remove_task(module_ids::MODEM, ops::RECEIVE, &[0]));
        assert_eq!(engine.take_response(0).unwrap().as_slice(), b"hello");
    }

    #[test]
    fn test_crlf_inside_payload_does_not_split_frame() {
        let engine = engine();
        engine.set_listening(true);

        feed(&engine, b"+IPD,1,6:ab\r\n");
        assert!(engine.take_response(1).is_none());
        feed(&engine, b"cd");
        assert_eq!(engine.take_response(1).unwrap().as_slice(), b"ab\r\ncd");
    }

    #[test]
    fn test_line_overflow_is_counted() {
        let engine = engine();
        let junk = [b'x'; LINE_BUFFER_SIZE + 1];
        feed(&engine, &junk);
        assert_eq!(engine.stats().line_overflows, 1);
    }

    #[test]
    fn test_oversized_payload_is_not_scanned() {
        let engine = engine();
        engine.set_listening(true);
        feed(&engine, b"0,CONNECT\r\n");

        let mut frame = std::vec::Vec::new();
        frame.extend_from_slice(b"+IPD,0,1100:");
        frame.resize(frame.len() + 1080, b'a');
        frame.extend_from_slice(b"0,CLOSED\r\nERROR\r\n");
        frame.extend_from_slice(b"bbb");
        let status = feed(&engine, &frame);

        assert!(status.contains(ModemStatus::IPD));
        assert!(!status.intersects(ModemStatus::CLOSED | ModemStatus::ERROR));
        assert!(engine.is_socket_alive(0));
        assert_eq!(engine.stats().line_overflows, 1);
        assert_eq!(engine.stats().payload_truncated, (1100 - SOCKET_RX_CAPACITY) as u32);

        // Token scanning resumes after the payload
        let status = feed(&engine, b"\r\n1,CONNECT\r\n");
        assert!(status.contains(ModemStatus::CONNECT));
        assert!(engine.is_socket_alive(1));
        assert_eq!(engine.take_response(0).unwrap().len(), SOCKET_RX_CAPACITY);
    }

    #[test]
    fn test_begin_wait_ignores_earlier_ok() {
        let engine = engine();
        let pending = engine.begin_command(b"AT+RST", ModemStatus::READY, 500).unwrap();
        feed(&engine, b"OK\r\n");
        assert_eq!(engine.poll_command(&pending), Some(ModemStatus::OK));

        let waiting = engine.begin_wait(ModemStatus::READY, 2000);
        assert!(engine.poll_command(&waiting).is_none());
        feed(&engine, b"ready\r\n");
        assert!(engine.poll_command(&waiting).unwrap().contains(ModemStatus::READY));
    }

    #[test]
    fn test_send_command_with_idle_delivers_response() {
        let engine = engine();
        engine.with_link(|link| link.respond_to(b"AT+CIPMUX=1", b"\r\nOK\r\n"));

        let status = engine
            .send_command_with(b"AT+CIPMUX=1", ModemStatus::empty(), 500, || {
                engine.on_rx_interrupt(None);
            })
            .unwrap();
        assert!(status.succeeded());
    }

    #[test]
    fn test_link_failure_is_reported() {
        let engine = engine();
        engine.with_link(|link| link.fail_writes(true));
        assert_eq!(
            engine.begin_command(b"AT", ModemStatus::empty(), 500),
            Err(ModemError::Link)
        );
        assert_eq!(engine.inspect(|state| state.watchdog().armed()), None);
    }
}
