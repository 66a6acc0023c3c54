//! Response parser and frame detection
//!
//! The parser is best-effort: anything that does not match a known token is
//! ignored. `+IPD` frames are located first so that their payload bytes are
//! never scanned for tokens.

use heapless::Vec;

use super::socket::{SocketId, SocketTable};
use super::status::{ModemStatus, CLOSED_TOKEN, CONNECT_TOKEN, IPD_TOKEN, IP_TOKEN, TOKENS};
use super::MAX_SOCKETS;

/// Result of parsing one accumulated buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Flags of every token found
    pub status: ModemStatus,
    /// Sockets that received data, in arrival order, without duplicates
    pub received: Vec<SocketId, MAX_SOCKETS>,
    /// Payload bytes dropped because a socket buffer was full
    pub truncated: usize,
    /// Socket and byte count still owed by a frame cut short at the end of
    /// the buffer
    pub unfinished: Option<(SocketId, usize)>,
}

impl ParseOutcome {
    fn note_received(&mut self, id: SocketId) {
        if !self.received.contains(&id) {
            // At most one entry per valid socket id
            let _ = self.received.push(id);
        }
    }
}

/// Header of an `+IPD` frame: `+IPD,<id>,<len>:` or single-connection `+IPD,<len>:`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IpdHeader {
    socket: SocketId,
    len: usize,
    /// Offset of the first payload byte
    payload_start: usize,
}

enum Header {
    Complete(IpdHeader),
    /// More bytes needed before the header can be read
    Incomplete,
    Malformed,
}

/// Read the IPD header whose `+IPD,` token starts at `at`.
fn read_ipd_header(buf: &[u8], at: usize) -> Header {
    let mut pos = at + IPD_TOKEN.len();
    let mut fields = [0usize; 2];
    let mut count = 0;
    let mut digits = 0;

    while let Some(&byte) = buf.get(pos) {
        match byte {
            b'0'..=b'9' => {
                fields[count] = fields[count]
                    .saturating_mul(10)
                    .saturating_add((byte - b'0') as usize);
                digits += 1;
            }
            b',' if count == 0 && digits > 0 => {
                count = 1;
                digits = 0;
            }
            b':' if digits > 0 => {
                let (socket, len) = if count == 0 {
                    (0, fields[0])
                } else {
                    (fields[0], fields[1])
                };
                return match SocketId::try_from(socket) {
                    Ok(socket) => Header::Complete(IpdHeader {
                        socket,
                        len,
                        payload_start: pos + 1,
                    }),
                    Err(_) => Header::Malformed,
                };
            }
            _ => return Header::Malformed,
        }
        pos += 1;
    }

    Header::Incomplete
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle, 0).is_some()
}

/// Parse `a.b.c.d` up to the closing quote.
fn parse_ipv4(bytes: &[u8]) -> Option<[u8; 4]> {
    let end = bytes.iter().position(|&b| b == b'"')?;
    let text = core::str::from_utf8(&bytes[..end]).ok()?;

    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in octets.iter_mut() {
        *octet = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

/// Scan a stretch of protocol text (no payload bytes) for tokens.
fn scan_text(
    text: &[u8],
    sockets: &mut SocketTable,
    ip: &mut Option<[u8; 4]>,
    outcome: &mut ParseOutcome,
) {
    for (token, flag) in TOKENS {
        if contains(text, token) {
            outcome.status |= *flag;
        }
    }

    // Connection events apply in the order the chip reported them
    for pos in 1..text.len() {
        let rest = &text[pos..];
        let id = text[pos - 1];
        if !id.is_ascii_digit() {
            continue;
        }
        let id = id - b'0';
        if rest.starts_with(CONNECT_TOKEN) {
            outcome.status |= ModemStatus::CONNECT;
            // Out-of-range ids are ignored
            let _ = sockets.open(id);
        } else if rest.starts_with(CLOSED_TOKEN) {
            outcome.status |= ModemStatus::CLOSED;
            sockets.close(id);
        }
    }

    if let Some(at) = find(text, IP_TOKEN, 0) {
        if let Some(address) = parse_ipv4(&text[at + IP_TOKEN.len()..]) {
            *ip = Some(address);
            outcome.status |= ModemStatus::IP_ADDRESS;
        }
    }
}

/// Parse an accumulated receive buffer.
///
/// Side effects: connection events create or destroy socket entries,
/// `+IPD` payloads are appended to their socket's buffer, an IP literal
/// replaces `ip`. A payload cut short stores what arrived and reports the
/// rest in [`ParseOutcome::unfinished`].
pub fn parse_response(
    buf: &[u8],
    sockets: &mut SocketTable,
    ip: &mut Option<[u8; 4]>,
) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut cursor = 0;

    while let Some(at) = find(buf, IPD_TOKEN, cursor) {
        scan_text(&buf[cursor..at], sockets, ip, &mut outcome);

        match read_ipd_header(buf, at) {
            Header::Complete(header) => {
                let wanted = header.payload_start.saturating_add(header.len);
                let end = wanted.min(buf.len());
                if wanted > end {
                    outcome.unfinished = Some((header.socket, wanted - end));
                }
                let payload = &buf[header.payload_start..end];
                if let Ok(dropped) = sockets.store_payload(header.socket, payload) {
                    outcome.truncated += dropped;
                    outcome.status |= ModemStatus::IPD;
                    outcome.note_received(header.socket);
                }
                cursor = end;
            }
            Header::Incomplete => {
                cursor = buf.len();
            }
            Header::Malformed => {
                cursor = at + IPD_TOKEN.len();
            }
        }
    }

    scan_text(&buf[cursor..], sockets, ip, &mut outcome);
    outcome
}

/// Whether the buffer holds a complete frame worth parsing.
///
/// Complete means: every `+IPD` payload has fully arrived, and the buffer
/// ends with CR-LF, with the data prompt, or exactly at the end of a payload.
pub fn frame_complete(buf: &[u8]) -> bool {
    let mut cursor = 0;
    let mut ends_in_payload = false;

    while let Some(at) = find(buf, IPD_TOKEN, cursor) {
        match read_ipd_header(buf, at) {
            Header::Complete(header) => {
                let end = header.payload_start.saturating_add(header.len);
                if end > buf.len() {
                    return false;
                }
                ends_in_payload = end == buf.len();
                cursor = end;
            }
            Header::Incomplete => return false,
            Header::Malformed => {
                ends_in_payload = false;
                cursor = at + IPD_TOKEN.len();
            }
        }
    }

    ends_in_payload || buf.ends_with(b"\r\n") || buf.ends_with(b"> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(buf: &[u8], sockets: &mut SocketTable) -> ParseOutcome {
        let mut ip = None;
        parse_response(buf, sockets, &mut ip)
    }

    #[test]
    fn test_ok_sets_only_ok() {
        let mut sockets = SocketTable::new();
        let outcome = parse(b"\r\nOK\r\n", &mut sockets);
        assert_eq!(outcome.status, ModemStatus::OK);
        assert!(outcome.received.is_empty());
    }

    #[test]
    fn test_ipd_fills_socket() {
        let mut sockets = SocketTable::new();
        let outcome = parse(b"+IPD,0,5:hello", &mut sockets);

        assert_eq!(outcome.status, ModemStatus::IPD);
        assert_eq!(outcome.received.as_slice(), &[0]);
        let socket = sockets.get(0).unwrap();
        assert!(socket.response_ready);
        assert_eq!(socket.response(), b"hello");
    }

    #[test]
    fn test_single_connection_ipd_maps_to_socket_zero() {
        let mut sockets = SocketTable::new();
        let outcome = parse(b"\r\n+IPD,3:abc", &mut sockets);
        assert!(outcome.status.contains(ModemStatus::IPD));
        assert_eq!(sockets.get(0).unwrap().response(), b"abc");
    }

    #[test]
    fn test_connect_creates_socket() {
        let mut sockets = SocketTable::new();
        let outcome = parse(b"2,CONNECT\r\n", &mut sockets);
        assert_eq!(outcome.status, ModemStatus::CONNECT);
        assert!(sockets.is_alive(2));
    }

    #[test]
    fn test_closed_destroys_socket() {
        let mut sockets = SocketTable::new();
        sockets.open(1).unwrap();
        let outcome = parse(b"1,CLOSED\r\n", &mut sockets);
        assert_eq!(outcome.status, ModemStatus::CLOSED);
        assert!(sockets.get(1).is_none());
    }

    #[test]
    fn test_events_apply_in_order() {
        let mut sockets = SocketTable::new();
        parse(b"0,CLOSED\r\n0,CONNECT\r\n1,CONNECT\r\n1,CLOSED\r\n", &mut sockets);
        assert!(sockets.is_alive(0));
        assert!(sockets.get(1).is_none());
    }

    #[test]
    fn test_payload_text_is_not_a_token() {
        let mut sockets = SocketTable::new();
        let outcome = parse(b"+IPD,1,12:ERROR\r\n3,CLO\r\nOK\r\n", &mut sockets);
        assert_eq!(outcome.status, ModemStatus::IPD | ModemStatus::OK);
        assert_eq!(sockets.get(1).unwrap().response(), b"ERROR\r\n3,CLO");
    }

    #[test]
    fn test_two_frames_in_one_buffer() {
        let mut sockets = SocketTable::new();
        let outcome = parse(b"+IPD,0,2:hi\r\n+IPD,1,3:yo!\r\n+IPD,0,1:!", &mut sockets);
        assert_eq!(outcome.received.as_slice(), &[0, 1]);
        assert_eq!(sockets.get(0).unwrap().response(), b"hi!");
        assert_eq!(sockets.get(1).unwrap().response(), b"yo!");
    }

    #[test]
    fn test_partial_payload_stores_available_bytes() {
        let mut sockets = SocketTable::new();
        let outcome = parse(b"+IPD,0,10:abc", &mut sockets);
        assert!(outcome.status.contains(ModemStatus::IPD));
        assert_eq!(outcome.unfinished, Some((0, 7)));
        assert_eq!(sockets.get(0).unwrap().response(), b"abc");

        let outcome = parse(b"+IPD,0,3:abc\r\n", &mut sockets);
        assert_eq!(outcome.unfinished, None);
    }

    #[test]
    fn test_malformed_header_ignored() {
        let mut sockets = SocketTable::new();
        let outcome = parse(b"+IPD,x,3:abc\r\nOK\r\n", &mut sockets);
        assert_eq!(outcome.status, ModemStatus::OK);
        assert!(sockets.is_empty());
    }

    #[test]
    fn test_ip_literal() {
        let mut sockets = SocketTable::new();
        let mut ip = None;
        let outcome = parse_response(
            b"+CIPSTA_CUR:ip:\"192.168.4.21\"\r\n",
            &mut sockets,
            &mut ip,
        );
        assert!(outcome.status.contains(ModemStatus::IP_ADDRESS));
        assert_eq!(ip, Some([192, 168, 4, 21]));

        let outcome = parse_response(b"ip:\"300.1.1.1\"\r\n", &mut sockets, &mut ip);
        assert!(!outcome.status.contains(ModemStatus::IP_ADDRESS));
        assert_eq!(ip, Some([192, 168, 4, 21]));
    }

    #[test]
    fn test_status_tokens() {
        let mut sockets = SocketTable::new();
        let status = parse(b"WIFI CONNECTED\r\nWIFI GOT IP\r\n", &mut sockets).status;
        assert_eq!(status, ModemStatus::WIFI_CONNECTED);

        let status = parse(b"\r\nSEND OK\r\n", &mut sockets).status;
        assert_eq!(status, ModemStatus::SEND_OK | ModemStatus::OK);

        let status = parse(b"OK\r\n> ", &mut sockets).status;
        assert_eq!(status, ModemStatus::OK | ModemStatus::DATA_PROMPT);

        let status = parse(b"busy p...\r\n", &mut sockets).status;
        assert_eq!(status, ModemStatus::BUSY);
    }

    #[test]
    fn test_frame_complete_on_crlf_and_prompt() {
        assert!(frame_complete(b"OK\r\n"));
        assert!(frame_complete(b"\r\n> "));
        assert!(!frame_complete(b"\r\nOK\r\n>"));
        assert!(!frame_complete(b"OK"));
        assert!(!frame_complete(b""));
    }

    #[test]
    fn test_frame_incomplete_inside_payload() {
        assert!(!frame_complete(b"+IPD,0"));
        assert!(!frame_complete(b"+IPD,0,5:he\r\n"));
        assert!(frame_complete(b"+IPD,0,5:hello"));
        assert!(frame_complete(b"+IPD,0,4:a\r\nb"));
        assert!(!frame_complete(b"+IPD,0,5:hello\r"));
        assert!(frame_complete(b"+IPD,0,5:hello\r\n"));
    }
}
