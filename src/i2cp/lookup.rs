//! Host lookup (§4.I): request/reply encoding, a wrapping `u16` request-id
//! counter, and the session-scoped LRU result cache (capacity 1000).

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::bytes::{push_u16, push_u32, read_u16, read_u32};
use crate::destination::Destination;
use crate::error::I2PError;

const CACHE_CAPACITY: usize = 1000;
const REQUEST_TYPE_HOSTNAME: u8 = 1;

/// Monotonic request-id generator, wrapping at 65535 back to 0.
pub struct RequestIdCounter {
	next: u16,
}

impl RequestIdCounter {
	pub fn new() -> RequestIdCounter {
		RequestIdCounter { next: 0 }
	}

	pub fn next_id(&mut self) -> u32 {
		let id = self.next;
		self.next = self.next.wrapping_add(1);
		id as u32
	}
}

impl Default for RequestIdCounter {
	fn default() -> Self {
		Self::new()
	}
}

/// `HostLookup(sessionId || u32 requestId || u32 timeoutMs || u8
/// requestType || len-prefixed-name)`.
pub fn encode_host_lookup(session_id: u16, request_id: u32, timeout_ms: u32, name: &str) -> Vec<u8> {
	let mut out = Vec::new();
	push_u16(&mut out, session_id);
	push_u32(&mut out, request_id);
	push_u32(&mut out, timeout_ms);
	out.push(REQUEST_TYPE_HOSTNAME);
	push_u16(&mut out, name.len() as u16);
	out.extend_from_slice(name.as_bytes());
	out
}

pub struct HostReply {
	pub session_id: u16,
	pub request_id: u32,
	pub result_code: u8,
	pub destination: Option<Destination>,
}

/// `HostReply(sessionId || u32 requestId || u8 resultCode || [destination])`.
/// Result code 0 means success and a destination follows; any other code
/// means failure with no trailing bytes.
pub fn decode_host_reply(payload: &[u8]) -> Result<HostReply, I2PError> {
	if payload.len() < 7 {
		return Err(I2PError::InvalidFraming("HostReply shorter than 7 bytes".into()));
	}
	let session_id = read_u16(&payload[0..2]).unwrap();
	let request_id = read_u32(&payload[2..6]).unwrap();
	let result_code = payload[6];
	let destination = if result_code == 0 {
		Some(Destination::parse(&payload[7..])?)
	} else {
		None
	};
	Ok(HostReply {
		session_id,
		request_id,
		result_code,
		destination,
	})
}

/// The session-scoped `(name -> destination)` LRU cache, capacity 1000
/// (§4.I, §5). Literal base64 destinations longer than 387 characters
/// bypass lookup entirely and are never cached (§4.H's equivalent rule).
pub struct LookupCache {
	cache: LruCache<String, Destination>,
}

impl LookupCache {
	pub fn new() -> LookupCache {
		LookupCache {
			cache: LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap()),
		}
	}

	pub fn get(&mut self, name: &str) -> Option<Destination> {
		self.cache.get(name).cloned()
	}

	pub fn insert(&mut self, name: String, destination: Destination) {
		self.cache.put(name, destination);
	}

	pub fn len(&self) -> usize {
		self.cache.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cache.is_empty()
	}
}

impl Default for LookupCache {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::SigType;
	use crate::destination::LocalDestination;

	#[test]
	fn request_id_counter_wraps_at_65536() {
		let mut counter = RequestIdCounter::new();
		for expected in 0..5u32 {
			assert_eq!(counter.next_id(), expected);
		}
		counter.next = u16::MAX;
		assert_eq!(counter.next_id(), 65535);
		assert_eq!(counter.next_id(), 0);
	}

	#[test]
	fn host_lookup_encodes_declared_layout() {
		let encoded = encode_host_lookup(7, 99, 10_000, "example.i2p");
		assert_eq!(read_u16(&encoded[0..2]).unwrap(), 7);
		assert_eq!(read_u32(&encoded[2..6]).unwrap(), 99);
		assert_eq!(read_u32(&encoded[6..10]).unwrap(), 10_000);
		assert_eq!(encoded[10], REQUEST_TYPE_HOSTNAME);
		assert_eq!(read_u16(&encoded[11..13]).unwrap(), 11);
		assert_eq!(&encoded[13..], b"example.i2p");
	}

	#[test]
	fn host_reply_success_carries_destination() {
		let local = LocalDestination::generate(SigType::Ed25519).unwrap();
		let dest_bytes = local.destination.to_bytes();

		let mut payload = Vec::new();
		push_u16(&mut payload, 1);
		push_u32(&mut payload, 42);
		payload.push(0);
		payload.extend_from_slice(&dest_bytes);

		let reply = decode_host_reply(&payload).unwrap();
		assert_eq!(reply.request_id, 42);
		assert_eq!(reply.destination.unwrap(), local.destination);
	}

	#[test]
	fn host_reply_failure_carries_no_destination() {
		let payload = [0, 1, 0, 0, 0, 42, 5];
		let reply = decode_host_reply(&payload).unwrap();
		assert_eq!(reply.result_code, 5);
		assert!(reply.destination.is_none());
	}

	#[test]
	fn lookup_cache_evicts_least_recently_used() {
		let mut cache = LookupCache::new();
		let local = LocalDestination::generate(SigType::Ed25519).unwrap();
		cache.insert("a.i2p".to_string(), local.destination.clone());
		assert_eq!(cache.get("a.i2p"), Some(local.destination));
		assert_eq!(cache.len(), 1);
	}
}
