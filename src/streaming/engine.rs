//! Streaming engine (§4.G): per-connection sequencing, ack/nack bookkeeping,
//! retransmission with a bounded retry ceiling, and the close handshake.
//!
//! This module is transport-agnostic: it turns application writes and
//! inbound packet bytes into outbound packet bytes and typed events, and
//! leaves actually moving bytes over a socket to the router-control client
//! (the only consumer that speaks the raw streaming wire format -- the
//! session-bridge client tunnels streams through the router's own `STREAM
//! CONNECT`/`STREAM ACCEPT` instead, see [`crate::sam`]).

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use rand::Rng;

use super::packet::{
	replay_guard_words, requires_signature, FLAG_CLOSE, FLAG_FROM_INCLUDED, FLAG_NO_ACK,
	FLAG_RESET, FLAG_SIGNATURE_INCLUDED, FLAG_SYNC,
};
use super::packet::Packet;
use crate::bytes::bit_is_set;
use crate::destination::{Destination, LocalDestination};
use crate::error::I2PError;

pub const DEFAULT_RESEND_DELAY: Duration = Duration::from_secs(3);
pub const RETRY_CEILING: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
	Init,
	SynSent,
	Established,
	Closing,
	Closed,
}

#[derive(Debug, Clone)]
pub enum StreamEvent {
	Connected,
	DataReady(Vec<u8>),
	PacketAcked(u32),
	RemoteClosing,
	Closed,
	Reset,
	ResendFailed,
}

struct SentPacket {
	bytes: Vec<u8>,
	first_sent: Instant,
	last_sent: Instant,
}

/// A single reliable stream connection. Owns all per-connection state named
/// in the data model (§3); retry timers are represented explicitly via
/// [`Stream::tick`] rather than ambient callbacks, so cancellation on
/// teardown (§9) just means dropping the `Stream`.
pub struct Stream {
	pub local: LocalDestination,
	pub remote: Destination,
	pub stream_id: u32,
	pub remote_stream_id: u32,
	pub initiator: bool,
	pub state: StreamState,

	our_sequence_num: u32,
	ack_through: Option<u32>,
	missing_packets: BTreeSet<u32>,
	received_packets: BTreeMap<u32, Packet>,
	sent_packets: BTreeMap<u32, SentPacket>,
	close_sent: bool,
	remote_requested_close: bool,

	resend_delay: Duration,
	retry_ceiling: Duration,

	events: Sender<StreamEvent>,
}

fn random_stream_id() -> u32 {
	rand::thread_rng().gen_range(1..=4_000_000_000u32)
}

impl Stream {
	pub fn new_initiator(
		local: LocalDestination,
		remote: Destination,
		events: Sender<StreamEvent>,
	) -> Stream {
		Stream {
			local,
			remote,
			stream_id: random_stream_id(),
			remote_stream_id: 0,
			initiator: true,
			state: StreamState::Init,
			our_sequence_num: 0,
			ack_through: None,
			missing_packets: BTreeSet::new(),
			received_packets: BTreeMap::new(),
			sent_packets: BTreeMap::new(),
			close_sent: false,
			remote_requested_close: false,
			resend_delay: DEFAULT_RESEND_DELAY,
			retry_ceiling: RETRY_CEILING,
			events,
		}
	}

	fn new_responder(
		local: LocalDestination,
		remote: Destination,
		remote_stream_id: u32,
		events: Sender<StreamEvent>,
	) -> Stream {
		Stream {
			local,
			remote,
			stream_id: random_stream_id(),
			remote_stream_id,
			initiator: false,
			state: StreamState::Init,
			our_sequence_num: 0,
			ack_through: None,
			missing_packets: BTreeSet::new(),
			received_packets: BTreeMap::new(),
			sent_packets: BTreeMap::new(),
			close_sent: false,
			remote_requested_close: false,
			resend_delay: DEFAULT_RESEND_DELAY,
			retry_ceiling: RETRY_CEILING,
			events,
		}
	}

	/// Accepts an inbound SYNC packet with `sendStreamId == 0` and no bound
	/// stream, creating a fresh responder `Stream` and feeding the SYNC
	/// through [`Stream::handle_packet`]. Returns the stream plus any bytes
	/// (the initial ACK) to send back.
	pub fn accept_sync(
		local: LocalDestination,
		raw: &[u8],
		events: Sender<StreamEvent>,
	) -> Result<(Stream, Option<Vec<u8>>), I2PError> {
		let packet = Packet::decode(raw)?;
		if !bit_is_set(packet.flags, FLAG_SYNC.trailing_zeros() as u8) || packet.send_stream_id != 0 {
			return Err(I2PError::InvalidPacket("not an initiating SYNC packet".into()));
		}
		let from = packet
			.from
			.clone()
			.ok_or_else(|| I2PError::InvalidPacket("SYNC without FROM_INCLUDED".into()))?;
		let remote_stream_id = packet.receive_stream_id;

		let mut stream = Stream::new_responder(local, from, remote_stream_id, events);
		let response = stream.handle_packet(raw)?;
		Ok((stream, response))
	}

	fn next_expected(&self) -> u32 {
		self.ack_through.map(|a| a + 1).unwrap_or(0)
	}

	/// Builds the next outbound packet's sequence number, skipping 0 (0 is
	/// reserved for the initiator's SYNC and for pure acks).
	fn next_seq(&mut self) -> u32 {
		self.our_sequence_num += 1;
		self.our_sequence_num
	}

	/// Writes application data. The very first write on an initiator stream
	/// becomes the signed SYNC packet; everything else is an ordinary data
	/// packet piggy-backing the current ack/nack state.
	pub fn write(&mut self, data: &[u8]) -> Result<Vec<u8>, I2PError> {
		let packet = if self.initiator && self.state == StreamState::Init {
			self.state = StreamState::SynSent;
			Packet {
				send_stream_id: 0,
				receive_stream_id: self.stream_id,
				sequence_num: 0,
				ack_through: 0,
				nacks: replay_guard_words(&self.remote),
				resend_delay: self.resend_delay.as_secs() as u8,
				flags: FLAG_SYNC | FLAG_NO_ACK | FLAG_SIGNATURE_INCLUDED | FLAG_FROM_INCLUDED,
				delay: None,
				from: Some(self.local.destination.clone()),
				max_packet_size: None,
				signature: None,
				payload: data.to_vec(),
			}
		} else {
			let seq = self.next_seq();
			Packet {
				send_stream_id: self.remote_stream_id,
				receive_stream_id: self.stream_id,
				sequence_num: seq,
				ack_through: self.ack_through.unwrap_or(0),
				nacks: self.missing_packets.iter().cloned().collect(),
				resend_delay: self.resend_delay.as_secs() as u8,
				flags: 0,
				delay: None,
				from: None,
				max_packet_size: None,
				signature: None,
				payload: data.to_vec(),
			}
		};
		self.send(packet)
	}

	/// Application-initiated close: emits a signed CLOSE packet on the
	/// stream's own sequence.
	pub fn close(&mut self) -> Result<Vec<u8>, I2PError> {
		let seq = self.next_seq();
		let packet = Packet {
			send_stream_id: self.remote_stream_id,
			receive_stream_id: self.stream_id,
			sequence_num: seq,
			ack_through: self.ack_through.unwrap_or(0),
			nacks: self.missing_packets.iter().cloned().collect(),
			resend_delay: self.resend_delay.as_secs() as u8,
			flags: FLAG_CLOSE | FLAG_SIGNATURE_INCLUDED,
			delay: None,
			from: None,
			max_packet_size: None,
			signature: None,
			payload: vec![],
		};
		self.close_sent = true;
		self.state = StreamState::Closing;
		self.send(packet)
	}

	fn send(&mut self, packet: Packet) -> Result<Vec<u8>, I2PError> {
		let bytes = packet.encode(Some(&self.local))?;
		if requires_signature(packet.flags) || packet.sequence_num != 0 {
			let now = Instant::now();
			self.sent_packets.insert(
				packet.sequence_num,
				SentPacket {
					bytes: bytes.clone(),
					first_sent: now,
					last_sent: now,
				},
			);
		}
		Ok(bytes)
	}

	/// Feeds an inbound packet through the state machine. Returns the ack (or
	/// close-ack) bytes to send back, if any. Malformed or unverifiable
	/// packets are dropped -- logged, never raised -- per the error-handling
	/// policy for forged/corrupt input.
	pub fn handle_packet(&mut self, raw: &[u8]) -> Result<Option<Vec<u8>>, I2PError> {
		let packet = match Packet::decode(raw) {
			Ok(p) => p,
			Err(e) => {
				log::warn!("dropping malformed stream packet: {}", e);
				return Ok(None);
			}
		};

		let send_id_ok = packet.send_stream_id == 0 || packet.send_stream_id == self.stream_id;
		let recognized_sender = packet.receive_stream_id == self.remote_stream_id;
		if !send_id_ok && !recognized_sender {
			log::warn!("dropping stream packet addressed to a different stream");
			return Ok(None);
		}

		if !packet.verify(&self.remote, &self.local.destination) {
			log::warn!("dropping stream packet with invalid signature or replay guard");
			return Ok(None);
		}

		if bit_is_set(packet.flags, FLAG_CLOSE.trailing_zeros() as u8)
			&& packet.payload.is_empty()
			&& packet.sequence_num == 0
			&& self.sent_packets.is_empty()
			&& self.state == StreamState::Closed
		{
			// A stray close-ack after we already tore down; ignore.
			return Ok(None);
		}

		if bit_is_set(packet.flags, FLAG_RESET.trailing_zeros() as u8) {
			self.state = StreamState::Closed;
			self.sent_packets.clear();
			let _ = self.events.send(StreamEvent::Reset);
			return Ok(None);
		}

		if self.remote_stream_id == 0 {
			self.remote_stream_id = packet.receive_stream_id;
		}
		if self.state == StreamState::Init || self.state == StreamState::SynSent {
			self.state = StreamState::Established;
			let _ = self.events.send(StreamEvent::Connected);
		}

		let is_close = bit_is_set(packet.flags, FLAG_CLOSE.trailing_zeros() as u8);
		if is_close {
			self.remote_requested_close = true;
			let _ = self.events.send(StreamEvent::RemoteClosing);
		}

		// Send-side retirement: everything acked and not nacked is done.
		let nack_set: HashSet<u32> = packet.nacks.iter().cloned().collect();
		let ack_through = packet.ack_through;
		let to_retire: Vec<u32> = self
			.sent_packets
			.keys()
			.cloned()
			.filter(|k| *k <= ack_through && !nack_set.contains(k))
			.collect();
		for k in to_retire {
			self.sent_packets.remove(&k);
			let _ = self.events.send(StreamEvent::PacketAcked(k));
		}

		// Receive-side reassembly.
		let mut ackable_seq = None;
		if packet.is_ackable() {
			let n = packet.sequence_num;
			ackable_seq = Some(n);
			let expected = self.next_expected();
			if n == expected {
				self.deliver(n, packet);
				loop {
					let next = self.next_expected();
					if let Some(buffered) = self.received_packets.remove(&next) {
						self.deliver(next, buffered);
					} else {
						break;
					}
				}
			} else if n > expected {
				for m in expected..n {
					self.missing_packets.insert(m);
				}
				self.missing_packets.remove(&n);
				self.received_packets.insert(n, packet);
			} else {
				self.missing_packets.remove(&n);
			}
		}

		if ackable_seq.is_some() || is_close {
			Ok(Some(self.build_response(is_close)?))
		} else {
			Ok(None)
		}
	}

	fn deliver(&mut self, seq: u32, packet: Packet) {
		if !packet.payload.is_empty() {
			let _ = self.events.send(StreamEvent::DataReady(packet.payload));
		}
		self.ack_through = Some(seq);
		self.missing_packets.remove(&seq);
	}

	fn build_response(&mut self, include_close: bool) -> Result<Vec<u8>, I2PError> {
		let packet = Packet {
			send_stream_id: self.remote_stream_id,
			receive_stream_id: self.stream_id,
			sequence_num: 0,
			ack_through: self.ack_through.unwrap_or(0),
			nacks: self.missing_packets.iter().cloned().collect(),
			resend_delay: self.resend_delay.as_secs() as u8,
			flags: if include_close {
				FLAG_CLOSE | FLAG_SIGNATURE_INCLUDED
			} else {
				0
			},
			delay: None,
			from: None,
			max_packet_size: None,
			signature: None,
			payload: vec![],
		};
		packet.encode(Some(&self.local))
	}

	/// Returns true once both sides are done: all outstanding packets
	/// retired and our own close sent.
	pub fn is_closed(&mut self) -> bool {
		if self.state == StreamState::Closing && self.close_sent && self.sent_packets.is_empty() {
			self.state = StreamState::Closed;
			let _ = self.events.send(StreamEvent::Closed);
		}
		self.state == StreamState::Closed
	}

	/// Drives retransmission: resends any outstanding packet whose
	/// `resend_delay` has elapsed since it was last sent, and fails the
	/// stream if any packet has been outstanding past the 300s ceiling.
	pub fn tick(&mut self, now: Instant) -> Vec<Vec<u8>> {
		let mut expired = Vec::new();
		let mut to_resend = Vec::new();
		for (&seq, sent) in self.sent_packets.iter_mut() {
			if now.duration_since(sent.first_sent) >= self.retry_ceiling {
				expired.push(seq);
				continue;
			}
			if now.duration_since(sent.last_sent) >= self.resend_delay {
				sent.last_sent = now;
				to_resend.push(sent.bytes.clone());
			}
		}
		if !expired.is_empty() {
			for seq in expired {
				self.sent_packets.remove(&seq);
			}
			self.state = StreamState::Closed;
			self.sent_packets.clear();
			let _ = self.events.send(StreamEvent::ResendFailed);
			return Vec::new();
		}
		to_resend
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::SigType;
	use crossbeam_channel::unbounded;

	fn pair() -> (LocalDestination, LocalDestination) {
		(
			LocalDestination::generate(SigType::Ed25519).unwrap(),
			LocalDestination::generate(SigType::Ed25519).unwrap(),
		)
	}

	#[test]
	fn sync_then_accept_establishes_both_sides() {
		let (alice, bob) = pair();
		let (alice_tx, alice_rx) = unbounded();
		let (bob_tx, bob_rx) = unbounded();

		let mut a = Stream::new_initiator(alice.clone(), bob.destination.clone(), alice_tx);
		let syn = a.write(b"hello from stream1").unwrap();

		let (mut b, ack) = Stream::accept_sync(bob.clone(), &syn, bob_tx).unwrap();
		assert_eq!(b.state, StreamState::Established);
		assert!(matches!(bob_rx.try_recv().unwrap(), StreamEvent::Connected));
		assert!(matches!(
			bob_rx.try_recv().unwrap(),
			StreamEvent::DataReady(ref d) if d == b"hello from stream1"
		));

		let ack_bytes = ack.expect("SYN should produce an ack response");
		a.handle_packet(&ack_bytes).unwrap();
		assert_eq!(a.state, StreamState::Established);
		assert!(matches!(alice_rx.try_recv().unwrap(), StreamEvent::Connected));
		assert!(matches!(alice_rx.try_recv().unwrap(), StreamEvent::PacketAcked(0)));

		let reply = b.write(b"hello from stream2").unwrap();
		a.handle_packet(&reply).unwrap();
		assert!(matches!(
			alice_rx.try_recv().unwrap(),
			StreamEvent::DataReady(ref d) if d == b"hello from stream2"
		));
	}

	#[test]
	fn out_of_order_delivery_reorders_and_drains() {
		let (alice, bob) = pair();
		let (tx, rx) = unbounded();
		let mut b = Stream::new_initiator(alice, bob.destination, tx);
		b.state = StreamState::Established;
		b.remote_stream_id = 99;

		let mk = |seq: u32, payload: &[u8]| Packet {
			send_stream_id: b.stream_id,
			receive_stream_id: 99,
			sequence_num: seq,
			ack_through: 0,
			nacks: vec![],
			resend_delay: 3,
			flags: 0,
			delay: None,
			from: None,
			max_packet_size: None,
			signature: None,
			payload: payload.to_vec(),
		};

		let p3 = mk(3, b"three").encode(None).unwrap();
		b.handle_packet(&p3).unwrap();
		assert_eq!(b.missing_packets, BTreeSet::from([1, 2]));

		let p1 = mk(1, b"one").encode(None).unwrap();
		b.handle_packet(&p1).unwrap();
		assert!(matches!(rx.try_recv().unwrap(), StreamEvent::DataReady(ref d) if d == b"one"));
		assert_eq!(b.missing_packets, BTreeSet::from([2]));

		let p2 = mk(2, b"two").encode(None).unwrap();
		b.handle_packet(&p2).unwrap();
		// draining delivers two, then three, in order.
		assert!(matches!(rx.try_recv().unwrap(), StreamEvent::DataReady(ref d) if d == b"two"));
		assert!(matches!(rx.try_recv().unwrap(), StreamEvent::DataReady(ref d) if d == b"three"));
		assert!(b.missing_packets.is_empty());
		assert_eq!(b.ack_through, Some(3));
	}

	#[test]
	fn retirement_keeps_only_nacked_packets() {
		let (alice, bob) = pair();
		let (tx, rx) = unbounded();
		let mut a = Stream::new_initiator(alice, bob.destination, tx);
		a.remote_stream_id = 7;
		a.state = StreamState::Established;
		for seq in 0..=5u32 {
			a.our_sequence_num = seq;
			a.sent_packets.insert(
				seq,
				SentPacket {
					bytes: vec![],
					first_sent: Instant::now(),
					last_sent: Instant::now(),
				},
			);
		}

		let incoming_ack = Packet {
			send_stream_id: a.stream_id,
			receive_stream_id: 7,
			sequence_num: 0,
			ack_through: 5,
			nacks: vec![3],
			resend_delay: 3,
			flags: 0,
			delay: None,
			from: None,
			max_packet_size: None,
			signature: None,
			payload: vec![],
		}
		.encode(None)
		.unwrap();

		a.handle_packet(&incoming_ack).unwrap();
		assert_eq!(a.sent_packets.keys().cloned().collect::<Vec<_>>(), vec![3]);
		let acked: Vec<u32> = std::iter::from_fn(|| rx.try_recv().ok())
			.filter_map(|e| match e {
				StreamEvent::PacketAcked(s) => Some(s),
				_ => None,
			})
			.collect();
		assert_eq!(acked, vec![0, 1, 2, 4, 5]);
	}

	#[test]
	fn tick_resends_before_ceiling_and_fails_after() {
		let (alice, bob) = pair();
		let (tx, rx) = unbounded();
		let mut a = Stream::new_initiator(alice, bob.destination, tx);
		a.resend_delay = Duration::from_millis(0);
		a.retry_ceiling = Duration::from_millis(0);
		a.sent_packets.insert(
			0,
			SentPacket {
				bytes: vec![1, 2, 3],
				first_sent: Instant::now() - Duration::from_secs(1),
				last_sent: Instant::now() - Duration::from_secs(1),
			},
		);

		let resent = a.tick(Instant::now());
		assert!(resent.is_empty());
		assert!(matches!(rx.try_recv().unwrap(), StreamEvent::ResendFailed));
		assert!(a.sent_packets.is_empty());
	}
}
