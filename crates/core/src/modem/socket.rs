//! Socket/client table
//!
//! Entries are created when the chip reports `<id>,CONNECT` (or when data
//! arrives for an unknown id) and destroyed on `<id>,CLOSED` or an explicit
//! close.

use heapless::Vec;

use super::error::ModemError;
use super::{MAX_SOCKETS, SOCKET_RX_CAPACITY};

/// Connection id as reported by the chip
pub type SocketId = u8;

/// One TCP connection
#[derive(Debug, Clone)]
pub struct Socket {
    /// Connection id
    pub id: SocketId,
    /// Connection is open
    pub alive: bool,
    /// Re-open automatically when found dead
    pub keep_alive: bool,
    /// Inbound data waiting in `response`
    pub response_ready: bool,
    response: Vec<u8, SOCKET_RX_CAPACITY>,
}

impl Socket {
    fn new(id: SocketId) -> Self {
        Self {
            id,
            alive: true,
            keep_alive: false,
            response_ready: false,
            response: Vec::new(),
        }
    }

    /// Buffered inbound bytes
    pub fn response(&self) -> &[u8] {
        &self.response
    }
}

/// Fixed-capacity table of open sockets
#[derive(Debug, Default)]
pub struct SocketTable {
    sockets: Vec<Socket, MAX_SOCKETS>,
}

impl SocketTable {
    /// Empty table
    pub const fn new() -> Self {
        Self {
            sockets: Vec::new(),
        }
    }

    /// Mark a socket open, creating its entry if needed.
    ///
    /// # Errors
    ///
    /// Returns `ModemError::InvalidSocket` if `id` is out of range.
    pub fn open(&mut self, id: SocketId) -> Result<&mut Socket, ModemError> {
        if id as usize >= MAX_SOCKETS {
            return Err(ModemError::InvalidSocket(id));
        }
        match self.sockets.iter().position(|s| s.id == id) {
            Some(index) => {
                let socket = &mut self.sockets[index];
                socket.alive = true;
                Ok(socket)
            }
            None => {
                // Ids are bounded by capacity, so a free slot always exists
                self.sockets
                    .push(Socket::new(id))
                    .map_err(|_| ModemError::InvalidSocket(id))?;
                let last = self.sockets.len() - 1;
                Ok(&mut self.sockets[last])
            }
        }
    }

    /// Destroy a socket entry; returns whether it existed.
    pub fn close(&mut self, id: SocketId) -> bool {
        match self.sockets.iter().position(|s| s.id == id) {
            Some(index) => {
                self.sockets.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Socket by id
    pub fn get(&self, id: SocketId) -> Option<&Socket> {
        self.sockets.iter().find(|s| s.id == id)
    }

    /// Mutable socket by id
    pub fn get_mut(&mut self, id: SocketId) -> Option<&mut Socket> {
        self.sockets.iter_mut().find(|s| s.id == id)
    }

    /// Whether `id` is open
    pub fn is_alive(&self, id: SocketId) -> bool {
        self.get(id).is_some_and(|s| s.alive)
    }

    /// Append inbound bytes to a socket and raise its ready flag.
    ///
    /// Returns the number of bytes that did not fit.
    ///
    /// # Errors
    ///
    /// Returns `ModemError::InvalidSocket` if `id` is out of range.
    pub fn store_payload(&mut self, id: SocketId, bytes: &[u8]) -> Result<usize, ModemError> {
        let socket = self.open(id)?;
        let room = SOCKET_RX_CAPACITY - socket.response.len();
        let take = bytes.len().min(room);
        // Cannot fail: `take` fits the remaining capacity
        let _ = socket.response.extend_from_slice(&bytes[..take]);
        socket.response_ready = true;
        Ok(bytes.len() - take)
    }

    /// Move a socket's buffered data out and clear its ready flag.
    pub fn take_response(&mut self, id: SocketId) -> Option<Vec<u8, SOCKET_RX_CAPACITY>> {
        let socket = self.get_mut(id)?;
        if !socket.response_ready {
            return None;
        }
        socket.response_ready = false;
        Some(core::mem::take(&mut socket.response))
    }

    /// Set whether a socket should be kept open.
    pub fn set_keep_alive(&mut self, id: SocketId, keep_alive: bool) -> bool {
        match self.get_mut(id) {
            Some(socket) => {
                socket.keep_alive = keep_alive;
                true
            }
            None => false,
        }
    }

    /// Open sockets in creation order (not stable across closes)
    pub fn iter(&self) -> impl Iterator<Item = &Socket> {
        self.sockets.iter()
    }

    /// Number of open sockets
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    /// Whether no socket is open
    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }

    /// Forget every socket (after a chip reset).
    pub fn clear(&mut self) {
        self.sockets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close() {
        let mut table = SocketTable::new();
        table.open(2).unwrap();
        assert!(table.is_alive(2));
        assert_eq!(table.len(), 1);

        // Re-opening reuses the entry
        table.open(2).unwrap();
        assert_eq!(table.len(), 1);

        assert!(table.close(2));
        assert!(!table.close(2));
        assert!(table.is_empty());
    }

    #[test]
    fn test_open_out_of_range() {
        let mut table = SocketTable::new();
        assert!(matches!(
            table.open(MAX_SOCKETS as SocketId),
            Err(ModemError::InvalidSocket(_))
        ));
    }

    #[test]
    fn test_every_id_fits() {
        let mut table = SocketTable::new();
        for id in 0..MAX_SOCKETS as SocketId {
            table.open(id).unwrap();
        }
        assert_eq!(table.len(), MAX_SOCKETS);
    }

    #[test]
    fn test_store_and_take_payload() {
        let mut table = SocketTable::new();
        assert_eq!(table.store_payload(0, b"hel").unwrap(), 0);
        assert_eq!(table.store_payload(0, b"lo").unwrap(), 0);
        assert!(table.get(0).unwrap().response_ready);

        let data = table.take_response(0).unwrap();
        assert_eq!(data.as_slice(), b"hello");
        assert!(!table.get(0).unwrap().response_ready);
        assert!(table.get(0).unwrap().response().is_empty());
        assert!(table.take_response(0).is_none());
    }

    #[test]
    fn test_store_payload_truncates() {
        let mut table = SocketTable::new();
        let big = [b'x'; SOCKET_RX_CAPACITY + 10];
        assert_eq!(table.store_payload(1, &big).unwrap(), 10);
        assert_eq!(table.store_payload(1, b"more").unwrap(), 4);
        assert_eq!(table.get(1).unwrap().response().len(), SOCKET_RX_CAPACITY);
    }

    #[test]
    fn test_keep_alive() {
        let mut table = SocketTable::new();
        assert!(!table.set_keep_alive(3, true));
        table.open(3).unwrap();
        assert!(table.set_keep_alive(3, true));
        assert!(table.get(3).unwrap().keep_alive);
    }
}
