//! Session-bridge (SAMv3) client (§4.H): a line-delimited text protocol
//! spoken over a dedicated TCP control socket per session/subsession/accept
//! loop. One primary session is created with `SESSION CREATE STYLE=PRIMARY`,
//! then named subsessions (`STREAM`, `DATAGRAM`, `RAW`) are layered on top
//! with `SESSION ADD`, matching the protocol's own session/subsession split.

use anyhow::Result;
use std::clone::Clone;
use std::collections::HashMap;
use std::io::prelude::*;
use std::io::{self, BufReader};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use log::debug;
use nom::IResult;

use crate::error::I2PError;
use crate::net::{I2pAddr, I2pSocketAddr};
use crate::sam::parsers::{
	sam_dest_reply, sam_hello, sam_naming_reply, sam_ping, sam_quit_status, sam_session_status,
	sam_stream_status,
};
use crate::sam::sam_options::{SAMOptions, SignatureType};

pub mod parsers;
pub mod sam_options;
pub mod session_manager;
pub mod session_watcher;

pub use sam_options::{I2CPOptions, SAMOptions as Options};
pub use session_manager::{SessionManager, SubSession};
pub use session_watcher::SamSessionWatcher;

pub static DEFAULT_API: &str = "127.0.0.1:7656";
/// Default UDP endpoint the router forwards/accepts datagram subsession
/// traffic on -- distinct from the TCP control port above.
pub static DEFAULT_UDP_FORWARD: &str = "127.0.0.1:7655";

static SAM_MIN: &str = "3.0";
static SAM_MAX: &str = "3.3";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionStyle {
	Primary,
	Datagram,
	Raw,
	Stream,
}

#[derive(Debug)]
pub struct SamConnection {
	#[cfg(feature = "public-conn")]
	pub conn: TcpStream,
	#[cfg(not(feature = "public-conn"))]
	conn: TcpStream,
}

#[derive(Debug)]
pub struct Session {
	#[cfg(feature = "public-conn")]
	pub sam: SamConnection,
	#[cfg(not(feature = "public-conn"))]
	sam: SamConnection,
	pub local_dest: String,
	pub nickname: String,
	/// Registration of this session's control socket with the process-wide
	/// shutdown coordinator (§9); `None` on handles that are themselves
	/// already a registered duplicate, so shutdown doesn't re-register a
	/// duplicate of a duplicate.
	shutdown_registration: Option<crate::shutdown::Registration>,
}
#[derive(Debug)]
pub struct StreamConnect {
	#[cfg(feature = "public-conn")]
	pub sam: SamConnection,
	#[cfg(not(feature = "public-conn"))]
	sam: SamConnection,
	#[cfg(feature = "public-conn")]
	pub session: Session,
	#[cfg(not(feature = "public-conn"))]
	session: Session,
	pub peer_dest: String,
	pub peer_port: u16,
	pub local_port: u16,
}

/// An open UDP datagram subsession (§4.H "Datagram subsessions"). `Datagram`
/// subsessions are repliable and filtered by `TO_PORT`; `Raw` subsessions
/// accept everything regardless of port, per spec.
pub struct DatagramSubsession {
	socket: UdpSocket,
	sam_udp_addr: SocketAddr,
	subsession_id: String,
	pub listen_port: u16,
	filter_by_port: bool,
}

pub struct ReceivedDatagram {
	pub source_destination: String,
	pub from_port: u16,
	pub to_port: u16,
	pub payload: Vec<u8>,
}

impl SessionStyle {
	fn string(&self) -> &str {
		match *self {
			SessionStyle::Primary => "PRIMARY",
			SessionStyle::Datagram => "DATAGRAM",
			SessionStyle::Raw => "RAW",
			SessionStyle::Stream => "STREAM",
		}
	}
}

fn verify_response<'a>(vec: &'a [(&str, &str)]) -> Result<HashMap<&'a str, &'a str>> {
	let map: HashMap<&str, &str> = vec.iter().copied().collect();
	let res = <&str>::clone(map.get("RESULT").unwrap_or(&"OK"));
	let msg = <&str>::clone(map.get("MESSAGE").unwrap_or(&""));
	match res {
		"OK" => Ok(map),
		"CANT_REACH_PEER" => Err(I2PError::SAMCantReachPeer(msg.to_string()).into()),
		"KEY_NOT_FOUND" => Err(I2PError::SAMKeyNotFound(msg.to_string()).into()),
		"PEER_NOT_FOUND" => Err(I2PError::SAMPeerNotFound(msg.to_string()).into()),
		"DUPLICATED_DEST" => Err(I2PError::SAMDuplicatedDest(msg.to_string()).into()),
		"INVALID_KEY" => Err(I2PError::SAMInvalidKey(msg.to_string()).into()),
		"INVALID_ID" => Err(I2PError::SAMInvalidId(msg.to_string()).into()),
		"TIMEOUT" => Err(I2PError::SAMTimeout(msg.to_string()).into()),
		"I2P_ERROR" => Err(I2PError::SAMI2PError(msg.to_string()).into()),
		_ => Err(I2PError::SAMInvalidMessage(msg.to_string()).into()),
	}
}

impl SamConnection {
	pub fn send<F>(&mut self, msg: String, mut reply_parser: F) -> Result<HashMap<String, String>>
	where
		F: FnMut(&str) -> IResult<&str, Vec<(&str, &str)>>,
	{
		debug!("-> {}", &msg);
		self.conn.write_all(&msg.into_bytes())?;

		// The router may interleave a keepalive `PING <remainder>\n` on an
		// otherwise idle control socket at any point; answer it transparently
		// and keep waiting for the reply this call actually asked for.
		let mut reader = BufReader::new(&self.conn);
		loop {
			let mut buffer = String::new();
			reader.read_line(&mut buffer)?;
			debug!("<- {}", &buffer);

			if let Ok((_, remainder)) = sam_ping(&buffer) {
				self.pong(remainder)?;
				continue;
			}

			// TODO: get rid of this hack
			let b = string_to_static_str(buffer);

			let vec_opts = reply_parser(b)?.1;
			return verify_response(&vec_opts).map(|m| {
				m.iter()
					.map(|(k, v)| (k.to_string(), v.to_string()))
					.collect()
			});
		}
	}

	fn handshake(&mut self) -> Result<HashMap<String, String>> {
		let hello_msg = format!("HELLO VERSION MIN={SAM_MIN} MAX={SAM_MAX} \n");
		self.send(hello_msg, sam_hello)
	}

	pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<SamConnection> {
		let tcp_stream = TcpStream::connect(addr)?;

		let mut socket = SamConnection { conn: tcp_stream };
		socket.handshake()?;

		Ok(socket)
	}

	// TODO: Implement a lookup table
	pub fn naming_lookup(&mut self, name: &str) -> Result<String> {
		let naming_lookup_msg = format!("NAMING LOOKUP NAME={name} \n");
		let ret = self.send(naming_lookup_msg, sam_naming_reply)?;
		Ok(ret["VALUE"].clone())
	}

	pub fn generate_destination(
		&mut self,
		signature_type: SignatureType,
	) -> Result<(String, String)> {
		let dest_gen_msg = format!(
			"DEST GENERATE SIGNATURE_TYPE={signature_type} \n",
			signature_type = signature_type.to_string(),
		);
		let ret = self.send(dest_gen_msg, sam_dest_reply)?;
		Ok((ret["PUB"].clone(), ret["PRIV"].clone()))
	}

	/// Replies to a router-initiated keepalive. Per spec the router may send
	/// `PING <remainder>` at any time; the client must answer with `PONG
	/// <remainder>\n` on the same socket without otherwise disturbing it.
	/// Takes `&self`: `TcpStream`'s `Write` impl for `&TcpStream` lets this
	/// run while [`Self::send`] still holds a read borrow of `self.conn` for
	/// the reply it's actually waiting on.
	pub fn pong(&self, remainder: &str) -> Result<()> {
		let msg = if remainder.is_empty() {
			"PONG\n".to_string()
		} else {
			format!("PONG {remainder}\n")
		};
		(&self.conn).write_all(msg.as_bytes())?;
		Ok(())
	}

	/// Cleanly closes the control socket: `QUIT\n`, await `QUIT STATUS
	/// RESULT=OK\n`. Every registered control socket must be sent this on
	/// process shutdown (see [`crate::shutdown`]).
	pub fn quit(&mut self) -> Result<()> {
		self.send("QUIT\n".to_string(), sam_quit_status)?;
		Ok(())
	}

	pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
		self.conn.set_nonblocking(nonblocking).map_err(|e| e.into())
	}
	pub fn set_read_timeout(&self, duration: Option<Duration>) -> std::io::Result<()> {
		self.conn.set_read_timeout(duration)
	}
	pub fn set_write_timeout(&self, duration: Option<Duration>) -> std::io::Result<()> {
		self.conn.set_write_timeout(duration)
	}
	pub fn duplicate(&self) -> Result<SamConnection> {
		self.conn
			.try_clone()
			.map(|s| SamConnection { conn: s })
			.map_err(|e| e.into())
	}
	/// attempts to return a handle to the underlying socket
	pub fn try_clone(&self) -> std::io::Result<TcpStream> {
		self.conn.try_clone()
	}
}

impl Session {
	/// Create a new session using all provided parameters
	pub fn create<A: ToSocketAddrs>(
		sam_addr: A,
		destination: &str,
		nickname: &str,
		style: SessionStyle,
		options: SAMOptions,
	) -> Result<Session> {
		let mut sam = SamConnection::connect(sam_addr)?;
		let create_session_msg = format!(
			"SESSION CREATE STYLE={style} ID={nickname} DESTINATION={destination} {options}\n",
			style = style.string(),
			nickname = nickname,
			destination = destination,
			options = options.options(),
		);

		sam.send(create_session_msg, sam_session_status)?;

		let local_dest = sam.naming_lookup("ME")?;

		// Register a duplicate of this control socket with the process-wide
		// shutdown coordinator (§9), so `shutdown::shutdown_all` can close it
		// even if the caller never explicitly calls `quit`.
		let registration = crate::shutdown::register(Session {
			sam: sam.duplicate()?,
			local_dest: local_dest.clone(),
			nickname: nickname.to_string(),
			shutdown_registration: None,
		});

		Ok(Session {
			sam,
			local_dest,
			nickname: nickname.to_string(),
			shutdown_registration: Some(registration),
		})
	}

	/// Create a primary session (§4.H) able to host named STREAM/DATAGRAM/RAW
	/// subsessions via [`SessionManager`].
	pub fn primary<A: ToSocketAddrs>(sam_addr: A, destination: &str) -> Result<Session> {
		Self::create(
			sam_addr,
			destination,
			&nickname(),
			SessionStyle::Primary,
			SAMOptions::default(),
		)
	}

	/// Create a new session identified by the provided destination. Auto-generates
	/// a nickname uniquely associated with the new session.
	pub fn from_destination<A: ToSocketAddrs>(sam_addr: A, destination: &str) -> Result<Session> {
		Self::create(
			sam_addr,
			destination,
			&nickname(),
			SessionStyle::Stream,
			SAMOptions::default(),
		)
	}

	/// Convenience constructor to create a new transient session with an
	/// auto-generated nickname.
	pub fn transient<A: ToSocketAddrs>(sam_addr: A) -> Result<Session> {
		Self::create(
			sam_addr,
			"TRANSIENT",
			&nickname(),
			SessionStyle::Stream,
			SAMOptions::default(),
		)
	}

	pub fn sam_api(&self) -> Result<SocketAddr> {
		self.sam.conn.peer_addr().map_err(|e| e.into())
	}

	pub fn naming_lookup(&mut self, name: &str) -> Result<String> {
		self.sam.naming_lookup(name)
	}

	/// Cleanly closes the session's control socket. Unregisters this
	/// session's shutdown-coordinator entry first, so a caller that closes
	/// its own session isn't sent a second, redundant `QUIT` by
	/// [`crate::shutdown::shutdown_all`] later.
	pub fn quit(&mut self) -> Result<()> {
		if let Some(registration) = self.shutdown_registration.take() {
			crate::shutdown::unregister(registration);
		}
		self.sam.quit()
	}

	pub fn duplicate(&self) -> Result<Session> {
		self.sam.duplicate().map(|s| Session {
			sam: s,
			local_dest: self.local_dest.clone(),
			nickname: self.nickname.clone(),
			shutdown_registration: None,
		})
	}
	/// attempts to return a handle to the underlying socket
	pub fn try_clone(&self) -> std::io::Result<TcpStream> {
		self.sam.try_clone()
	}
}

impl StreamConnect {
	/// Create a new SAM client connection to the provided destination and port.
	/// Also creates a new transient session to support the connection.
	pub fn new<A: ToSocketAddrs>(
		sam_addr: A,
		destination: &str,
		port: u16,
	) -> Result<StreamConnect> {
		let session = Session::transient(sam_addr)?;
		Self::with_session(&session, destination, port)
	}

	/// Create a new SAM client connection to the provided destination and port
	/// using the provided session.
	pub fn with_session(session: &Session, dest: &str, port: u16) -> Result<StreamConnect> {
		Self::with_session_ports(session, dest, 0, port)
	}

	/// As [`Self::with_session`], but also sets `FROM_PORT` (the local
	/// virtual port streams bound to this connection appear to originate
	/// from -- used by the remote side's `TO_PORT` filtering).
	pub fn with_session_ports(
		session: &Session,
		dest: &str,
		from_port: u16,
		to_port: u16,
	) -> Result<StreamConnect> {
		let mut sam = SamConnection::connect(session.sam_api()?).unwrap();
		let dest = sam.naming_lookup(dest)?;

		let mut stream_msg = format!(
			"STREAM CONNECT ID={nickname} DESTINATION={destination} SILENT=false",
			nickname = session.nickname,
			destination = dest,
		);
		if from_port > 0 {
			stream_msg.push_str(&format!(" FROM_PORT={from_port}"));
		}
		if to_port > 0 {
			stream_msg.push_str(&format!(" TO_PORT={to_port}"));
		}
		stream_msg.push('\n');

		sam.send(stream_msg, sam_stream_status)?;

		Ok(StreamConnect {
			sam,
			session: session.duplicate()?,
			peer_dest: dest,
			peer_port: to_port,
			local_port: from_port,
		})
	}

	pub fn peer_addr(&self) -> Result<(String, u16)> {
		Ok((self.peer_dest.clone(), self.peer_port))
	}

	pub fn local_addr(&self) -> Result<(String, u16)> {
		Ok((self.session.local_dest.clone(), self.local_port))
	}

	pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
		self.sam.set_nonblocking(nonblocking)
	}
	pub fn set_read_timeout(&self, duration: Option<Duration>) -> std::io::Result<()> {
		self.sam.set_read_timeout(duration)
	}
	pub fn set_write_timeout(&self, duration: Option<Duration>) -> std::io::Result<()> {
		self.sam.set_write_timeout(duration)
	}
	pub fn shutdown(&self, how: Shutdown) -> Result<()> {
		self.sam.conn.shutdown(how).map_err(|e| e.into())
	}

	pub fn duplicate(&self) -> Result<StreamConnect> {
		Ok(StreamConnect {
			sam: self.sam.duplicate()?,
			session: self.session.duplicate()?,
			peer_dest: self.peer_dest.clone(),
			peer_port: self.peer_port,
			local_port: self.local_port,
		})
	}
	/// calls try_clone against the Session object
	pub fn try_clone_session(&self) -> std::io::Result<TcpStream> {
		self.session.try_clone()
	}
	/// calls try_clone against the SamConnection object
	pub fn try_clone_sam(&self) -> std::io::Result<TcpStream> {
		self.sam.try_clone()
	}
}

impl Read for StreamConnect {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.sam.conn.read(buf)
	}
}

impl Write for StreamConnect {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.sam.conn.write(buf)
	}
	fn flush(&mut self) -> io::Result<()> {
		self.sam.conn.flush()
	}
}

pub struct StreamForward {
	session: Session,
}

impl StreamForward {
	pub fn new<A: ToSocketAddrs>(sam_addr: A) -> Result<StreamForward> {
		Ok(StreamForward {
			session: Session::transient(sam_addr)?,
		})
	}

	/// Create a new SAM client connection to the provided destination and port
	/// using the provided session.
	pub fn with_session(session: &Session) -> Result<StreamForward> {
		Ok(StreamForward {
			session: session.duplicate()?,
		})
	}

	pub fn accept(&self) -> Result<(StreamConnect, I2pSocketAddr)> {
		let mut sam_conn = SamConnection::connect(self.session.sam_api()?).unwrap();

		let accept_stream_msg = format!(
			"STREAM ACCEPT ID={nickname} SILENT=false\n",
			nickname = self.session.nickname,
		);
		sam_conn.send(accept_stream_msg, sam_stream_status)?;

		let mut stream = StreamConnect {
			sam: sam_conn,
			session: self.session.duplicate()?,
			peer_dest: "".to_string(),
			// ports only provided with SAM v3.2+ (not on i2pd)
			peer_port: 0,
			local_port: 0,
		};

		let dest_line: String = {
			let mut buf_read = io::BufReader::new(stream.duplicate()?);
			let mut dest_line = String::new();
			buf_read.read_line(&mut dest_line)?;
			dest_line
		};
		let mut fields = dest_line.split_whitespace();
		let destination = fields.next().unwrap_or("").trim().to_string();
		if destination.is_empty() {
			return Err(
				I2PError::SAMKeyNotFound("No b64 destination in accept".to_string()).into(),
			);
		}
		let mut from_port = 0u16;
		let mut to_port = 0u16;
		for field in fields {
			if let Some(v) = field.strip_prefix("FROM_PORT=") {
				from_port = v.parse().unwrap_or(0);
			} else if let Some(v) = field.strip_prefix("TO_PORT=") {
				to_port = v.parse().unwrap_or(0);
			}
		}

		let addr = I2pSocketAddr::new(I2pAddr::from_b64(&destination)?, from_port);
		stream.peer_dest = destination;
		stream.peer_port = from_port;
		stream.local_port = to_port;

		Ok((stream, addr))
	}

	pub fn local_addr(&self) -> Result<(String, u16)> {
		Ok((self.session.local_dest.clone(), 0))
	}

	pub fn duplicate(&self) -> Result<StreamForward> {
		Ok(StreamForward {
			session: self.session.duplicate()?,
		})
	}
}

impl DatagramSubsession {
	fn new(
		listen_port: u16,
		subsession_id: &str,
		filter_by_port: bool,
		sam_udp_addr: SocketAddr,
	) -> Result<DatagramSubsession> {
		let socket = UdpSocket::bind(("127.0.0.1", listen_port))?;
		Ok(DatagramSubsession {
			socket,
			sam_udp_addr,
			subsession_id: subsession_id.to_string(),
			listen_port,
			filter_by_port,
		})
	}

	/// Sends a repliable (or raw, depending on which style this subsession
	/// was added as) datagram: `3.0 <subsession_id> <dest> FROM_PORT=..
	/// TO_PORT=..\n<payload>` over UDP to the router's forwarding port.
	pub fn send(&self, destination: &str, from_port: u16, to_port: u16, payload: &[u8]) -> Result<()> {
		let mut msg = format!("3.0 {} {destination} FROM_PORT={from_port} TO_PORT={to_port}\n", self.subsession_id);
		let mut buf = msg.into_bytes();
		buf.extend_from_slice(payload);
		self.socket.send_to(&buf, self.sam_udp_addr)?;
		msg.clear();
		Ok(())
	}

	/// Receives and parses one datagram. Returns `Ok(None)` when the
	/// datagram is filtered out (repliable subsession bound to a listen port
	/// that doesn't match `TO_PORT`).
	pub fn recv(&self, buf: &mut [u8]) -> Result<Option<ReceivedDatagram>> {
		let (len, _) = self.socket.recv_from(buf)?;
		self.parse_datagram(buf, len)
	}

	pub fn set_read_timeout(&self, duration: Option<Duration>) -> std::io::Result<()> {
		self.socket.set_read_timeout(duration)
	}

	/// Like [`Self::recv`] but leaves the datagram in the socket's queue.
	pub fn peek(&self, buf: &mut [u8]) -> Result<Option<ReceivedDatagram>> {
		let (len, _) = self.socket.peek_from(buf)?;
		self.parse_datagram(buf, len)
	}

	fn parse_datagram(&self, buf: &[u8], len: usize) -> Result<Option<ReceivedDatagram>> {
		let text_len = buf[..len]
			.iter()
			.position(|&b| b == b'\n')
			.map(|p| p + 1)
			.ok_or_else(|| I2PError::SAMInvalidMessage("datagram missing preamble newline".into()))?;
		let preamble = std::str::from_utf8(&buf[..text_len])
			.map_err(|_| I2PError::SAMInvalidMessage("datagram preamble wasn't utf8".into()))?;
		let (_, (source_destination, opts)) = parsers::sam_datagram_preamble(preamble)?;
		let opts: HashMap<&str, &str> = opts.into_iter().collect();
		let from_port: u16 = opts.get("FROM_PORT").and_then(|p| p.parse().ok()).unwrap_or(0);
		let to_port: u16 = opts.get("TO_PORT").and_then(|p| p.parse().ok()).unwrap_or(0);

		if self.filter_by_port && self.listen_port != 0 && to_port != self.listen_port {
			return Ok(None);
		}

		Ok(Some(ReceivedDatagram {
			source_destination: source_destination.to_string(),
			from_port,
			to_port,
			payload: buf[text_len..len].to_vec(),
		}))
	}

	pub fn try_clone(&self) -> Result<DatagramSubsession> {
		Ok(DatagramSubsession {
			socket: self.socket.try_clone()?,
			sam_udp_addr: self.sam_udp_addr,
			subsession_id: self.subsession_id.clone(),
			listen_port: self.listen_port,
			filter_by_port: self.filter_by_port,
		})
	}
}

pub fn nickname() -> String {
	format!("i2prs-{}", crate::utils::rand_string(8))
}

/*
As of Rust version 1.26, it is possible to convert a String to &'static str without using unsafe code:
This converts the String instance into a boxed str and immediately leaks it. This frees all excess capacity the string may currently occupy.

Note that there are almost always solutions that are preferable over leaking objects, e.g. using the crossbeam crate if you want to share state between threads.
*/
fn string_to_static_str(s: String) -> &'static str {
	Box::leak(s.into_boxed_str())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn session_style_strings_match_protocol_keywords() {
		assert_eq!(SessionStyle::Primary.string(), "PRIMARY");
		assert_eq!(SessionStyle::Stream.string(), "STREAM");
		assert_eq!(SessionStyle::Datagram.string(), "DATAGRAM");
		assert_eq!(SessionStyle::Raw.string(), "RAW");
	}

	#[test]
	fn verify_response_maps_every_known_result_code() {
		assert!(verify_response(&[("RESULT", "OK")]).is_ok());
		assert!(matches!(
			verify_response(&[("RESULT", "CANT_REACH_PEER")]),
			Err(e) if e.downcast_ref::<I2PError>() == Some(&I2PError::SAMCantReachPeer("".into()))
		));
		assert!(matches!(
			verify_response(&[("RESULT", "INVALID_ID")]),
			Err(e) if matches!(e.downcast_ref::<I2PError>(), Some(I2PError::SAMInvalidId(_)))
		));
	}

	#[test]
	fn nickname_has_expected_prefix_and_length() {
		let n = nickname();
		assert!(n.starts_with("i2prs-"));
		assert_eq!(n.len(), "i2prs-".len() + 8);
	}

	/// Drives `SamConnection::send` against a fake router that interleaves a
	/// keepalive `PING` before the reply a command actually asked for,
	/// confirming the PING is answered transparently and doesn't surface as a
	/// parse error to the caller (spec.md §4.H "Keepalive").
	#[test]
	fn send_transparently_answers_a_ping_before_returning_the_real_reply() {
		use std::net::TcpListener;
		use std::thread;

		let listener = TcpListener::bind("127.0.0.1:0").unwrap();
		let addr = listener.local_addr().unwrap();

		let server = thread::spawn(move || {
			let (stream, _) = listener.accept().unwrap();
			let mut reader = BufReader::new(stream.try_clone().unwrap());
			let mut writer = stream;

			writer.write_all(b"PING abc123\n").unwrap();

			let mut pong_line = String::new();
			reader.read_line(&mut pong_line).unwrap();
			assert_eq!(pong_line, "PONG abc123\n");

			writer.write_all(b"HELLO REPLY RESULT=OK VERSION=3.3\n").unwrap();
		});

		let mut sam = SamConnection {
			conn: TcpStream::connect(addr).unwrap(),
		};
		let reply = sam
			.send(
				"HELLO VERSION MIN=3.0 MAX=3.3 \n".to_string(),
				sam_hello,
			)
			.unwrap();
		assert_eq!(reply.get("RESULT").map(String::as_str), Some("OK"));

		server.join().unwrap();
	}
}
