//! The router-control client task (§4.I, §5): a single-threaded-cooperative
//! multiplexer over one TCP socket, the streaming engine's `Stream`s, and
//! datagram envelopes. Unlike [`crate::sam`]'s blocking sockets, this client
//! is the one component that actually needs to multiplex three asynchronous
//! sources at once (router reads, application writes, lookup timeouts), so
//! it is built on `tokio` rather than the teacher's `std::net` style -- the
//! crate's `Cargo.toml` already carries `tokio` for exactly this.
//!
//! A dedicated reader task decodes frames off the socket and forwards them
//! over an unbounded channel; the main task only ever awaits two mpsc
//! receivers (`recv()` is cancellation-safe), never a raw socket read, so
//! `tokio::select!` can't drop a partially-read frame.

use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_channel::{Receiver as CbReceiver, Sender as CbSender};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot};

use crate::bytes::{bit_is_set, push_u16, push_u32, read_u16, read_u32};
use crate::datagram::{
	build_raw, build_repliable, frame_payload, parse_repliable, unframe_payload, PROTO_RAW_DATAGRAM,
	PROTO_REPLIABLE_DATAGRAM, PROTO_STREAMING,
};
use crate::destination::{Destination, LocalDestination};
use crate::error::I2PError;
use crate::streaming::engine::Stream;
use crate::streaming::packet::{Packet, FLAG_SYNC};
use crate::streaming::StreamEvent;

use super::leaseset::{decode_lease1s, LeaseSet2};
use super::lookup::{decode_host_reply, encode_host_lookup, LookupCache, RequestIdCounter};
use super::session::{build_get_date, build_session_config, decode_session_status, decode_set_date};
use super::wire::{read_frame, write_frame, write_prelude, MessageType};

const LOOKUP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub struct IncomingStream {
	pub stream_id: u32,
	pub remote: Destination,
	pub events: CbReceiver<StreamEvent>,
}

pub struct IncomingDatagram {
	pub source: Destination,
	pub src_port: u16,
	pub dst_port: u16,
	pub payload: Vec<u8>,
	pub raw: bool,
}

enum ClientCommand {
	Connect {
		destination: Destination,
		from_port: u16,
		to_port: u16,
		events: CbSender<StreamEvent>,
		reply: oneshot::Sender<Result<u32, I2PError>>,
	},
	Accept {
		reply: oneshot::Sender<IncomingStream>,
	},
	Write {
		stream_id: u32,
		data: Vec<u8>,
		reply: oneshot::Sender<Result<(), I2PError>>,
	},
	Close {
		stream_id: u32,
	},
	SendDatagram {
		repliable: bool,
		destination: Destination,
		payload: Vec<u8>,
		from_port: u16,
		to_port: u16,
		reply: oneshot::Sender<Result<(), I2PError>>,
	},
	Lookup {
		name: String,
		reply: oneshot::Sender<Result<Destination, I2PError>>,
	},
	LookupTimeout(u32),
	Shutdown,
}

/// A cheap, cloneable handle to a running [`I2cpClient`] task.
#[derive(Clone)]
pub struct I2cpHandle {
	cmd_tx: mpsc::UnboundedSender<ClientCommand>,
}

impl I2cpHandle {
	pub async fn connect_stream(
		&self,
		destination: Destination,
		from_port: u16,
		to_port: u16,
		events: CbSender<StreamEvent>,
	) -> Result<u32, I2PError> {
		let (reply, rx) = oneshot::channel();
		self.send(ClientCommand::Connect {
			destination,
			from_port,
			to_port,
			events,
			reply,
		})?;
		rx.await.map_err(|_| I2PError::HandshakeFailed("client task stopped".into()))?
	}

	pub async fn accept_stream(&self) -> Result<IncomingStream, I2PError> {
		let (reply, rx) = oneshot::channel();
		self.send(ClientCommand::Accept { reply })?;
		rx.await.map_err(|_| I2PError::HandshakeFailed("client task stopped".into()))
	}

	pub async fn write_stream(&self, stream_id: u32, data: Vec<u8>) -> Result<(), I2PError> {
		let (reply, rx) = oneshot::channel();
		self.send(ClientCommand::Write { stream_id, data, reply })?;
		rx.await.map_err(|_| I2PError::HandshakeFailed("client task stopped".into()))?
	}

	pub fn close_stream(&self, stream_id: u32) -> Result<(), I2PError> {
		self.send(ClientCommand::Close { stream_id })
	}

	pub async fn send_datagram(
		&self,
		repliable: bool,
		destination: Destination,
		payload: Vec<u8>,
		from_port: u16,
		to_port: u16,
	) -> Result<(), I2PError> {
		let (reply, rx) = oneshot::channel();
		self.send(ClientCommand::SendDatagram {
			repliable,
			destination,
			payload,
			from_port,
			to_port,
			reply,
		})?;
		rx.await.map_err(|_| I2PError::HandshakeFailed("client task stopped".into()))?
	}

	pub async fn lookup(&self, name: &str) -> Result<Destination, I2PError> {
		let (reply, rx) = oneshot::channel();
		self.send(ClientCommand::Lookup {
			name: name.to_string(),
			reply,
		})?;
		rx.await.map_err(|_| I2PError::HandshakeFailed("client task stopped".into()))?
	}

	pub fn shutdown(&self) -> Result<(), I2PError> {
		self.send(ClientCommand::Shutdown)
	}

	fn send(&self, cmd: ClientCommand) -> Result<(), I2PError> {
		self.cmd_tx
			.send(cmd)
			.map_err(|_| I2PError::HandshakeFailed("client task stopped".into()))
	}
}

fn now_ms() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as u64
}

fn now_sec() -> u32 {
	(now_ms() / 1000) as u32
}

fn classify_message_status(code: u8) -> Result<(), I2PError> {
	match code {
		1 | 2..=7 => Ok(()),
		other => Err(I2PError::MessageStatusFailed(other)),
	}
}

fn encode_send_message(session_id: u16, destination: &Destination, payload: &[u8], nonce: u32) -> Vec<u8> {
	let mut out = Vec::new();
	push_u16(&mut out, session_id);
	out.extend_from_slice(&destination.to_bytes());
	push_u32(&mut out, payload.len() as u32);
	out.extend_from_slice(payload);
	push_u32(&mut out, nonce);
	out
}

/// Connects to the router, performs the GetDate/SetDate/CreateSession
/// handshake, and spawns the background task that owns the socket from then
/// on. Returns a handle the application uses to open streams, send
/// datagrams, and perform lookups.
pub async fn connect<A: ToSocketAddrs>(
	addr: A,
	local: LocalDestination,
	datagrams: CbSender<IncomingDatagram>,
) -> Result<I2cpHandle, I2PError> {
	let mut socket = TcpStream::connect(addr).await?;
	write_prelude(&mut socket).await?;

	write_frame(&mut socket, MessageType::GetDate, &build_get_date()).await?;
	let set_date = read_frame(&mut socket).await?;
	if set_date.message_type != Some(MessageType::SetDate) {
		return Err(I2PError::HandshakeFailed("expected SetDate after GetDate".into()));
	}
	decode_set_date(&set_date.payload)?;

	let config = build_session_config(&local, now_ms())?;
	write_frame(&mut socket, MessageType::CreateSession, &config).await?;
	let status_frame = read_frame(&mut socket).await?;
	if status_frame.message_type != Some(MessageType::SessionStatus) {
		return Err(I2PError::HandshakeFailed("expected SessionStatus after CreateSession".into()));
	}
	let status = decode_session_status(&status_frame.payload)?;
	if !status.status.is_success() {
		return Err(I2PError::SessionStatusError(format!("{:?}", status.status)));
	}

	let (read_half, write_half) = socket.into_split();
	let (frame_tx, frame_rx) = mpsc::unbounded_channel();
	tokio::spawn(async move {
		let mut reader = read_half;
		loop {
			match read_frame(&mut reader).await {
				Ok(frame) => {
					if frame_tx.send(frame).is_err() {
						break;
					}
				}
				Err(_) => break,
			}
		}
	});

	let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
	let client = I2cpClient {
		writer: write_half,
		session_id: status.session_id,
		local,
		streams: HashMap::new(),
		stream_ports: HashMap::new(),
		accept_backlog: VecDeque::new(),
		accept_waiters: VecDeque::new(),
		lookup_cache: LookupCache::new(),
		pending_lookups: HashMap::new(),
		request_ids: RequestIdCounter::new(),
		next_nonce: 1,
		datagrams,
		cmd_tx: cmd_tx.clone(),
	};
	tokio::spawn(client.run(frame_rx, cmd_rx));

	let handle = I2cpHandle { cmd_tx };
	// Registers a clone with the process-wide shutdown coordinator (§9) so
	// `shutdown::shutdown_all` can tell the background task to stop even if
	// the application never calls `I2cpHandle::shutdown` itself.
	crate::shutdown::register(handle.clone());
	Ok(handle)
}

struct I2cpClient {
	writer: tokio::net::tcp::OwnedWriteHalf,
	session_id: u16,
	local: LocalDestination,
	streams: HashMap<u32, Stream>,
	/// `(our_port, remote_port)` learned from the gzip-header port fields.
	stream_ports: HashMap<u32, (u16, u16)>,
	accept_backlog: VecDeque<IncomingStream>,
	accept_waiters: VecDeque<oneshot::Sender<IncomingStream>>,
	lookup_cache: LookupCache,
	pending_lookups: HashMap<u32, (String, oneshot::Sender<Result<Destination, I2PError>>)>,
	request_ids: RequestIdCounter,
	next_nonce: u32,
	datagrams: CbSender<IncomingDatagram>,
	cmd_tx: mpsc::UnboundedSender<ClientCommand>,
}

impl I2cpClient {
	async fn run(mut self, mut frame_rx: mpsc::UnboundedReceiver<super::wire::Frame>, mut cmd_rx: mpsc::UnboundedReceiver<ClientCommand>) {
		loop {
			tokio::select! {
				frame = frame_rx.recv() => {
					match frame {
						Some(frame) => {
							if let Err(e) = self.handle_frame(frame).await {
								log::warn!("error handling router frame: {}", e);
							}
						}
						None => break,
					}
				}
				cmd = cmd_rx.recv() => {
					match cmd {
						Some(ClientCommand::Shutdown) | None => break,
						Some(cmd) => {
							if let Err(e) = self.handle_command(cmd).await {
								log::warn!("error handling client command: {}", e);
							}
						}
					}
				}
			}
		}
	}

	async fn handle_frame(&mut self, frame: super::wire::Frame) -> Result<(), I2PError> {
		let message_type = match frame.message_type {
			Some(t) => t,
			None => {
				log::info!("dropping unknown I2CP message type code {}", frame.raw_type);
				return Ok(());
			}
		};
		match message_type {
			MessageType::RequestVariableLeaseSet => self.handle_request_leaseset(&frame.payload).await,
			MessageType::MessageStatus => self.handle_message_status(&frame.payload),
			MessageType::MessagePayload => self.handle_message_payload(&frame.payload).await,
			MessageType::HostReply => {
				self.handle_host_reply(&frame.payload);
				Ok(())
			}
			MessageType::Disconnect => Err(I2PError::HandshakeFailed("router sent Disconnect".into())),
			other => {
				log::info!("ignoring unexpected I2CP message {:?} on an established session", other);
				Ok(())
			}
		}
	}

	async fn handle_request_leaseset(&mut self, payload: &[u8]) -> Result<(), I2PError> {
		if payload.len() < 3 {
			return Err(I2PError::InvalidFraming("RequestVariableLeaseSet shorter than 3 bytes".into()));
		}
		let tunnel_count = payload[2];
		let leases = decode_lease1s(&payload[3..], tunnel_count)?;
		let leaseset = LeaseSet2::build(&self.local, leases, now_sec())?;
		write_frame(&mut self.writer, MessageType::CreateLeaseSet2, &leaseset.encode()).await?;
		Ok(())
	}

	fn handle_message_status(&mut self, payload: &[u8]) -> Result<(), I2PError> {
		if payload.len() < 15 {
			return Err(I2PError::InvalidFraming("MessageStatus shorter than 15 bytes".into()));
		}
		let status = payload[6];
		if let Err(e) = classify_message_status(status) {
			log::warn!("message delivery failed: {}", e);
		}
		Ok(())
	}

	async fn handle_message_payload(&mut self, payload: &[u8]) -> Result<(), I2PError> {
		if payload.len() < 10 {
			return Err(I2PError::InvalidFraming("MessagePayload shorter than 10 bytes".into()));
		}
		let payload_len = read_u32(&payload[6..10]).unwrap() as usize;
		if payload.len() < 10 + payload_len {
			return Err(I2PError::InvalidFraming("MessagePayload shorter than declared length".into()));
		}
		let framed = &payload[10..10 + payload_len];
		let unframed = unframe_payload(framed)?;

		match unframed.protocol_id {
			PROTO_STREAMING => self.route_stream_packet(unframed.src_port, unframed.dst_port, &unframed.payload).await,
			PROTO_REPLIABLE_DATAGRAM => {
				match parse_repliable(&unframed.payload) {
					Ok((source, payload)) => {
						let _ = self.datagrams.send(IncomingDatagram {
							source,
							src_port: unframed.src_port,
							dst_port: unframed.dst_port,
							payload,
							raw: false,
						});
					}
					Err(e) => log::warn!("dropping repliable datagram: {}", e),
				}
				Ok(())
			}
			PROTO_RAW_DATAGRAM => {
				// Raw datagrams carry no sender identity; the crate has no
				// way to attribute one, so source is left as the session's
				// own destination purely as a non-meaningful placeholder.
				let _ = self.datagrams.send(IncomingDatagram {
					source: self.local.destination.clone(),
					src_port: unframed.src_port,
					dst_port: unframed.dst_port,
					payload: unframed.payload,
					raw: true,
				});
				Ok(())
			}
			other => {
				log::info!("dropping MessagePayload with unknown protocol id {}", other);
				Ok(())
			}
		}
	}

	async fn route_stream_packet(&mut self, src_port: u16, dst_port: u16, raw: &[u8]) -> Result<(), I2PError> {
		let peek = match Packet::decode(raw) {
			Ok(p) => p,
			Err(e) => {
				log::warn!("dropping malformed stream packet: {}", e);
				return Ok(());
			}
		};

		let existing = self
			.streams
			.contains_key(&peek.receive_stream_id)
			.then_some(peek.receive_stream_id)
			.or_else(|| {
				self.streams
					.iter()
					.find(|(_, s)| s.remote_stream_id == peek.send_stream_id)
					.map(|(id, _)| *id)
			});

		if let Some(stream_id) = existing {
			self.stream_ports.insert(stream_id, (dst_port, src_port));
			let response = {
				let stream = self.streams.get_mut(&stream_id).unwrap();
				stream.handle_packet(raw)?
			};
			if let Some(bytes) = response {
				self.send_on_stream(stream_id, bytes).await?;
			}
			let closed = self.streams.get_mut(&stream_id).map(|s| s.is_closed()).unwrap_or(false);
			if closed {
				self.streams.remove(&stream_id);
				self.stream_ports.remove(&stream_id);
			}
			return Ok(());
		}

		if !bit_is_set(peek.flags, FLAG_SYNC.trailing_zeros() as u8) || peek.send_stream_id != 0 {
			log::warn!("dropping stream packet addressed to no known stream");
			return Ok(());
		}

		let (events, rx) = crossbeam_channel::unbounded();
		let (stream, response) = Stream::accept_sync(self.local.clone(), raw, events)?;
		let stream_id = stream.stream_id;
		let remote = stream.remote.clone();
		self.streams.insert(stream_id, stream);
		self.stream_ports.insert(stream_id, (dst_port, src_port));

		if let Some(bytes) = response {
			self.send_on_stream(stream_id, bytes).await?;
		}

		let incoming = IncomingStream { stream_id, remote, events: rx };
		if let Some(waiter) = self.accept_waiters.pop_front() {
			let _ = waiter.send(incoming);
		} else {
			self.accept_backlog.push_back(incoming);
		}
		Ok(())
	}

	fn handle_host_reply(&mut self, payload: &[u8]) {
		let reply = match decode_host_reply(payload) {
			Ok(r) => r,
			Err(e) => {
				log::warn!("dropping malformed HostReply: {}", e);
				return;
			}
		};
		let Some((name, sender)) = self.pending_lookups.remove(&reply.request_id) else {
			return;
		};
		match reply.destination {
			Some(destination) => {
				self.lookup_cache.insert(name, destination.clone());
				let _ = sender.send(Ok(destination));
			}
			None => {
				let _ = sender.send(Err(I2PError::SAMKeyNotFound(format!(
					"host lookup failed with result code {}",
					reply.result_code
				))));
			}
		}
	}

	async fn handle_command(&mut self, cmd: ClientCommand) -> Result<(), I2PError> {
		match cmd {
			ClientCommand::Connect {
				destination,
				from_port,
				to_port,
				events,
				reply,
			} => {
				let mut stream = Stream::new_initiator(self.local.clone(), destination, events);
				let syn = stream.write(&[])?;
				let stream_id = stream.stream_id;
				self.streams.insert(stream_id, stream);
				self.stream_ports.insert(stream_id, (from_port, to_port));
				let result = self.send_on_stream(stream_id, syn).await;
				let _ = reply.send(result.map(|_| stream_id));
				Ok(())
			}
			ClientCommand::Accept { reply } => {
				if let Some(incoming) = self.accept_backlog.pop_front() {
					let _ = reply.send(incoming);
				} else {
					self.accept_waiters.push_back(reply);
				}
				Ok(())
			}
			ClientCommand::Write { stream_id, data, reply } => {
				let result = match self.streams.get_mut(&stream_id) {
					Some(stream) => stream.write(&data),
					None => Err(I2PError::SAMInvalidId(stream_id.to_string())),
				};
				let result = match result {
					Ok(bytes) => self.send_on_stream(stream_id, bytes).await,
					Err(e) => Err(e),
				};
				let _ = reply.send(result);
				Ok(())
			}
			ClientCommand::Close { stream_id } => {
				if let Some(stream) = self.streams.get_mut(&stream_id) {
					let bytes = stream.close()?;
					self.send_on_stream(stream_id, bytes).await?;
				}
				Ok(())
			}
			ClientCommand::SendDatagram {
				repliable,
				destination,
				payload,
				from_port,
				to_port,
				reply,
			} => {
				let result = self.send_datagram(repliable, &destination, &payload, from_port, to_port).await;
				let _ = reply.send(result);
				Ok(())
			}
			ClientCommand::Lookup { name, reply } => self.handle_lookup(name, reply).await,
			ClientCommand::LookupTimeout(request_id) => {
				if let Some((_, sender)) = self.pending_lookups.remove(&request_id) {
					let _ = sender.send(Err(I2PError::LookupTimeout(request_id.to_string())));
				}
				Ok(())
			}
			ClientCommand::Shutdown => Ok(()),
		}
	}

	async fn send_on_stream(&mut self, stream_id: u32, packet_bytes: Vec<u8>) -> Result<(), I2PError> {
		let remote = self
			.streams
			.get(&stream_id)
			.map(|s| s.remote.clone())
			.ok_or_else(|| I2PError::SAMInvalidId(stream_id.to_string()))?;
		let (our_port, remote_port) = self.stream_ports.get(&stream_id).copied().unwrap_or((0, 0));
		let framed = frame_payload(&packet_bytes, our_port, remote_port, PROTO_STREAMING)?;
		self.send_message(&remote, &framed).await
	}

	async fn send_datagram(
		&mut self,
		repliable: bool,
		destination: &Destination,
		payload: &[u8],
		from_port: u16,
		to_port: u16,
	) -> Result<(), I2PError> {
		let envelope = if repliable {
			build_repliable(&self.local, payload)?
		} else {
			build_raw(payload)
		};
		let proto = if repliable { PROTO_REPLIABLE_DATAGRAM } else { PROTO_RAW_DATAGRAM };
		let framed = frame_payload(&envelope, from_port, to_port, proto)?;
		self.send_message(destination, &framed).await
	}

	async fn send_message(&mut self, destination: &Destination, framed_payload: &[u8]) -> Result<(), I2PError> {
		let nonce = self.next_nonce;
		self.next_nonce = self.next_nonce.wrapping_add(1);
		let message = encode_send_message(self.session_id, destination, framed_payload, nonce);
		write_frame(&mut self.writer, MessageType::SendMessage, &message).await
	}

	async fn handle_lookup(&mut self, name: String, reply: oneshot::Sender<Result<Destination, I2PError>>) -> Result<(), I2PError> {
		if name.len() > 387 {
			let _ = reply.send(Destination::from_base64(&name));
			return Ok(());
		}
		if let Some(destination) = self.lookup_cache.get(&name) {
			let _ = reply.send(Ok(destination));
			return Ok(());
		}

		let request_id = self.request_ids.next_id();
		let lookup = encode_host_lookup(self.session_id, request_id, LOOKUP_TIMEOUT.as_millis() as u32, &name);
		self.pending_lookups.insert(request_id, (name, reply));
		write_frame(&mut self.writer, MessageType::HostLookup, &lookup).await?;

		let cmd_tx = self.cmd_tx.clone();
		tokio::spawn(async move {
			tokio::time::sleep(LOOKUP_TIMEOUT).await;
			let _ = cmd_tx.send(ClientCommand::LookupTimeout(request_id));
		});
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classify_message_status_matches_spec_ranges() {
		assert!(classify_message_status(1).is_ok());
		assert!(classify_message_status(2).is_ok());
		assert!(classify_message_status(7).is_ok());
		assert!(classify_message_status(0).is_err());
		assert!(classify_message_status(8).is_err());
		assert!(classify_message_status(23).is_err());
	}

	#[test]
	fn encode_send_message_lays_out_destination_then_length_prefixed_payload_then_nonce() {
		let local = LocalDestination::generate(crate::crypto::SigType::Ed25519).unwrap();
		let encoded = encode_send_message(7, &local.destination, b"hello", 42);
		assert_eq!(read_u16(&encoded[0..2]).unwrap(), 7);
		let dest_len = local.destination.byte_length();
		assert_eq!(&encoded[2..2 + dest_len], &local.destination.to_bytes()[..]);
		let mut cursor = 2 + dest_len;
		assert_eq!(read_u32(&encoded[cursor..cursor + 4]).unwrap(), 5);
		cursor += 4;
		assert_eq!(&encoded[cursor..cursor + 5], b"hello");
		cursor += 5;
		assert_eq!(read_u32(&encoded[cursor..cursor + 4]).unwrap(), 42);
	}
}
