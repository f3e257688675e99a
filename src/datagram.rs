//! Datagram envelope codec: the signed repliable-datagram wrapper, the
//! (trivial) raw-datagram passthrough, and the gzip-framed payload format
//! shared with the router-control transport (component I reuses
//! [`frame_payload`]/[`unframe_payload`] for every `SendMessage`/
//! `MessagePayload`).

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::destination::{Destination, LocalDestination};
use crate::error::I2PError;

pub const PROTO_STREAMING: u8 = 6;
pub const PROTO_REPLIABLE_DATAGRAM: u8 = 17;
pub const PROTO_RAW_DATAGRAM: u8 = 18;

/// Builds a repliable datagram: `destination_bytes || signature || payload`.
/// The signature is over `SHA-256(payload)` for DSA-SHA1 destinations and
/// over raw `payload` otherwise (`LocalDestination::sign_payload`).
pub fn build_repliable(local: &LocalDestination, payload: &[u8]) -> Result<Vec<u8>, I2PError> {
	let signature = local.sign_payload(payload)?;
	let mut out = local.destination.to_bytes();
	out.extend_from_slice(&signature);
	out.extend_from_slice(payload);
	Ok(out)
}

/// Parses a repliable datagram, verifying the embedded signature. Per spec
/// §7.4, a signature mismatch is a verification failure to be dropped by the
/// caller, not a reason to tear down anything -- this function still returns
/// `Err` so the caller can choose to log-and-drop.
pub fn parse_repliable(bytes: &[u8]) -> Result<(Destination, Vec<u8>), I2PError> {
	let destination = Destination::parse(bytes)?;
	let dest_len = destination.byte_length();
	let sig_len = destination.sig_type.signature_len();
	if bytes.len() < dest_len + sig_len {
		return Err(I2PError::InvalidFraming(
			"repliable datagram shorter than destination + signature".into(),
		));
	}
	let signature = &bytes[dest_len..dest_len + sig_len];
	let payload = &bytes[dest_len + sig_len..];
	if !destination.verify_payload(payload, signature) {
		return Err(I2PError::VerificationFailed);
	}
	Ok((destination, payload.to_vec()))
}

/// Raw datagrams carry no envelope; this exists only so call sites that
/// handle all three protocol ids uniformly don't need a special case.
pub fn build_raw(payload: &[u8]) -> Vec<u8> {
	payload.to_vec()
}

/// Gzip-compresses `payload` and substitutes the source/destination port and
/// protocol id into otherwise-unused gzip header bytes (offsets 4-5, 6-7, 9
/// -- the MTIME and OS fields), per §4.E. The header isn't covered by gzip's
/// CRC, so the substitution doesn't break decompression.
pub fn frame_payload(
	payload: &[u8],
	src_port: u16,
	dst_port: u16,
	protocol_id: u8,
) -> Result<Vec<u8>, I2PError> {
	let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
	encoder.write_all(payload)?;
	let mut framed = encoder.finish()?;
	if framed.len() < 10 {
		return Err(I2PError::InvalidFraming("gzip output shorter than a header".into()));
	}
	framed[4] = (src_port >> 8) as u8;
	framed[5] = (src_port & 0xff) as u8;
	framed[6] = (dst_port >> 8) as u8;
	framed[7] = (dst_port & 0xff) as u8;
	framed[9] = protocol_id;
	Ok(framed)
}

pub struct FramedPayload {
	pub src_port: u16,
	pub dst_port: u16,
	pub protocol_id: u8,
	pub payload: Vec<u8>,
}

pub fn unframe_payload(framed: &[u8]) -> Result<FramedPayload, I2PError> {
	if framed.len() < 10 {
		return Err(I2PError::InvalidFraming("framed payload shorter than a gzip header".into()));
	}
	let src_port = u16::from_be_bytes([framed[4], framed[5]]);
	let dst_port = u16::from_be_bytes([framed[6], framed[7]]);
	let protocol_id = framed[9];

	let mut decoder = GzDecoder::new(framed);
	let mut payload = Vec::new();
	decoder
		.read_to_end(&mut payload)
		.map_err(|e| I2PError::InvalidFraming(e.to_string()))?;

	Ok(FramedPayload {
		src_port,
		dst_port,
		protocol_id,
		payload,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::SigType;

	#[test]
	fn repliable_round_trip() {
		let local = LocalDestination::generate(SigType::Ed25519).unwrap();
		let envelope = build_repliable(&local, b"hello to port 13").unwrap();
		let (sender, payload) = parse_repliable(&envelope).unwrap();
		assert_eq!(sender, local.destination);
		assert_eq!(payload, b"hello to port 13");
	}

	#[test]
	fn repliable_round_trip_dsa_sha1() {
		let local = LocalDestination::generate(SigType::DsaSha1).unwrap();
		let envelope = build_repliable(&local, b"dsa datagram").unwrap();
		let (_, payload) = parse_repliable(&envelope).unwrap();
		assert_eq!(payload, b"dsa datagram");
	}

	#[test]
	fn tampered_repliable_payload_fails_verification() {
		let local = LocalDestination::generate(SigType::Ed25519).unwrap();
		let mut envelope = build_repliable(&local, b"hello").unwrap();
		let last = envelope.len() - 1;
		envelope[last] ^= 0xFF;
		assert!(matches!(
			parse_repliable(&envelope),
			Err(I2PError::VerificationFailed)
		));
	}

	#[test]
	fn raw_datagram_is_identity() {
		assert_eq!(build_raw(b"just bytes"), b"just bytes");
	}

	#[test]
	fn frame_unframe_round_trip() {
		let framed = frame_payload(b"stream bytes", 13, 14, PROTO_STREAMING).unwrap();
		let unframed = unframe_payload(&framed).unwrap();
		assert_eq!(unframed.src_port, 13);
		assert_eq!(unframed.dst_port, 14);
		assert_eq!(unframed.protocol_id, PROTO_STREAMING);
		assert_eq!(unframed.payload, b"stream bytes");
	}

	#[test]
	fn frame_header_substitution_does_not_break_decompression() {
		let payload = vec![0x42u8; 4096];
		let framed = frame_payload(&payload, 1, 2, PROTO_RAW_DATAGRAM).unwrap();
		let unframed = unframe_payload(&framed).unwrap();
		assert_eq!(unframed.payload, payload);
	}
}
