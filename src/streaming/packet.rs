//! Stream-layer packet codec (§4.F): header, nacks, options in fixed order,
//! and the zero-fill/back-patch signature dance required on SYNC/CLOSE/
//! RESET/ECHO packets.

use sha2::{Digest, Sha256};

use crate::bytes::{bit_is_set, push_u16, push_u32, read_u16, read_u32};
use crate::destination::{Destination, LocalDestination};
use crate::error::I2PError;

pub const FLAG_SYNC: u16 = 0x0001;
pub const FLAG_CLOSE: u16 = 0x0002;
pub const FLAG_RESET: u16 = 0x0004;
pub const FLAG_SIGNATURE_INCLUDED: u16 = 0x0008;
pub const FLAG_SIGNATURE_REQUESTED: u16 = 0x0010;
pub const FLAG_FROM_INCLUDED: u16 = 0x0020;
pub const FLAG_DELAY_REQUESTED: u16 = 0x0040;
pub const FLAG_MAX_PACKET_SIZE_INCLUDED: u16 = 0x0080;
pub const FLAG_PROFILE_INTERACTIVE: u16 = 0x0100;
pub const FLAG_ECHO: u16 = 0x0200;
pub const FLAG_NO_ACK: u16 = 0x0400;
pub const FLAG_OFFLINE_SIGNATURE: u16 = 0x0800;

fn bit_index(flag: u16) -> u8 {
	flag.trailing_zeros() as u8
}

/// Whether `flags` requires a signed, zero-filled-then-back-patched packet.
pub fn requires_signature(flags: u16) -> bool {
	flags & (FLAG_SYNC | FLAG_CLOSE | FLAG_RESET | FLAG_ECHO) != 0
}

/// The eight big-endian u32 words of `SHA-256(recipient destination bytes)`,
/// reused as the SYNC packet's anti-replay proof-of-intent.
pub fn replay_guard_words(recipient: &Destination) -> Vec<u32> {
	let mut hasher = Sha256::new();
	hasher.update(recipient.to_bytes());
	let digest = hasher.finalize();
	digest
		.chunks(4)
		.map(|c| u32::from_be_bytes(c.try_into().unwrap()))
		.collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
	pub send_stream_id: u32,
	pub receive_stream_id: u32,
	pub sequence_num: u32,
	pub ack_through: u32,
	pub nacks: Vec<u32>,
	pub resend_delay: u8,
	pub flags: u16,
	pub delay: Option<u16>,
	pub from: Option<Destination>,
	pub max_packet_size: Option<u16>,
	pub signature: Option<Vec<u8>>,
	pub payload: Vec<u8>,
}

impl Packet {
	/// Whether this packet carries deliverable sequence information (as
	/// opposed to being a pure ACK, which always uses sequence 0 and has no
	/// payload of its own).
	pub fn is_ackable(&self) -> bool {
		self.sequence_num != 0 || bit_is_set(self.flags, bit_index(FLAG_SYNC))
	}

	/// Builds the header+options+payload buffer with the signature region
	/// (if any) zero-filled, returning the buffer and the offset the
	/// signature bytes start at.
	fn assemble(&self, sig_len: usize) -> Result<(Vec<u8>, usize), I2PError> {
		if self.nacks.len() > 255 {
			return Err(I2PError::InvalidPacket("more than 255 nacks".into()));
		}
		let mut buf = Vec::new();
		push_u32(&mut buf, self.send_stream_id);
		push_u32(&mut buf, self.receive_stream_id);
		push_u32(&mut buf, self.sequence_num);
		push_u32(&mut buf, self.ack_through);
		buf.push(self.nacks.len() as u8);
		for nack in &self.nacks {
			push_u32(&mut buf, *nack);
		}
		buf.push(self.resend_delay);
		push_u16(&mut buf, self.flags);

		let mut opts = Vec::new();
		if bit_is_set(self.flags, bit_index(FLAG_DELAY_REQUESTED)) {
			push_u16(&mut opts, self.delay.unwrap_or(0));
		}
		if bit_is_set(self.flags, bit_index(FLAG_FROM_INCLUDED)) {
			let from = self
				.from
				.as_ref()
				.ok_or_else(|| I2PError::InvalidPacket("FROM_INCLUDED set without a from destination".into()))?;
			opts.extend(from.to_bytes());
		}
		if bit_is_set(self.flags, bit_index(FLAG_MAX_PACKET_SIZE_INCLUDED)) {
			push_u16(&mut opts, self.max_packet_size.unwrap_or(0));
		}
		if bit_is_set(self.flags, bit_index(FLAG_OFFLINE_SIGNATURE)) {
			return Err(I2PError::InvalidPacket("offline signatures are unsupported".into()));
		}
		if bit_is_set(self.flags, bit_index(FLAG_SIGNATURE_INCLUDED)) {
			opts.extend(std::iter::repeat(0u8).take(sig_len));
		}

		push_u16(&mut buf, opts.len() as u16);
		buf.extend(opts);
		let sig_offset = buf.len() - sig_len;
		buf.extend(&self.payload);
		Ok((buf, sig_offset))
	}

	/// Encodes this packet to bytes. `signer` is required whenever
	/// `SIGNATURE_INCLUDED` is set; the signature is computed over the whole
	/// buffer with its own region zero-filled, then back-patched in.
	pub fn encode(&self, signer: Option<&LocalDestination>) -> Result<Vec<u8>, I2PError> {
		let needs_sig = bit_is_set(self.flags, bit_index(FLAG_SIGNATURE_INCLUDED));
		let sig_len = if needs_sig {
			signer
				.ok_or_else(|| I2PError::InvalidPacket("SIGNATURE_INCLUDED set without a signer".into()))?
				.destination
				.sig_type
				.signature_len()
		} else {
			0
		};
		let (mut buf, sig_offset) = self.assemble(sig_len)?;
		if needs_sig {
			let signature = signer.unwrap().sign(&buf)?;
			buf[sig_offset..sig_offset + sig_len].copy_from_slice(&signature);
		}
		Ok(buf)
	}

	pub fn decode(bytes: &[u8]) -> Result<Packet, I2PError> {
		if bytes.len() < 17 {
			return Err(I2PError::InvalidPacket("shorter than fixed header".into()));
		}
		let send_stream_id = read_u32(&bytes[0..4]).unwrap();
		let receive_stream_id = read_u32(&bytes[4..8]).unwrap();
		let sequence_num = read_u32(&bytes[8..12]).unwrap();
		let ack_through = read_u32(&bytes[12..16]).unwrap();
		let nack_count = bytes[16] as usize;
		let mut offset = 17;

		if bytes.len() < offset + nack_count * 4 {
			return Err(I2PError::InvalidPacket("truncated nack list".into()));
		}
		let mut nacks = Vec::with_capacity(nack_count);
		for _ in 0..nack_count {
			nacks.push(read_u32(&bytes[offset..offset + 4]).unwrap());
			offset += 4;
		}

		if bytes.len() < offset + 1 + 2 + 2 {
			return Err(I2PError::InvalidPacket("truncated after nacks".into()));
		}
		let resend_delay = bytes[offset];
		offset += 1;
		let flags = read_u16(&bytes[offset..offset + 2]).unwrap();
		offset += 2;
		let options_len = read_u16(&bytes[offset..offset + 2]).unwrap() as usize;
		offset += 2;

		if bytes.len() < offset + options_len {
			return Err(I2PError::InvalidPacket("truncated options block".into()));
		}
		let options = &bytes[offset..offset + options_len];
		offset += options_len;
		let payload = bytes[offset..].to_vec();

		let mut opt_offset = 0usize;
		let delay = if bit_is_set(flags, bit_index(FLAG_DELAY_REQUESTED)) {
			let v = read_u16(&options[opt_offset..])
				.ok_or_else(|| I2PError::InvalidPacket("truncated delay option".into()))?;
			opt_offset += 2;
			Some(v)
		} else {
			None
		};
		let from = if bit_is_set(flags, bit_index(FLAG_FROM_INCLUDED)) {
			let dest = Destination::parse(&options[opt_offset..])?;
			opt_offset += dest.byte_length();
			Some(dest)
		} else {
			None
		};
		let max_packet_size = if bit_is_set(flags, bit_index(FLAG_MAX_PACKET_SIZE_INCLUDED)) {
			let v = read_u16(&options[opt_offset..])
				.ok_or_else(|| I2PError::InvalidPacket("truncated max-packet-size option".into()))?;
			opt_offset += 2;
			Some(v)
		} else {
			None
		};
		if bit_is_set(flags, bit_index(FLAG_OFFLINE_SIGNATURE)) {
			return Err(I2PError::InvalidPacket("offline signatures are unsupported".into()));
		}
		let signature = if bit_is_set(flags, bit_index(FLAG_SIGNATURE_INCLUDED)) {
			if opt_offset > options.len() {
				return Err(I2PError::InvalidPacket("options block shorter than declared fields".into()));
			}
			Some(options[opt_offset..].to_vec())
		} else {
			None
		};

		Ok(Packet {
			send_stream_id,
			receive_stream_id,
			sequence_num,
			ack_through,
			nacks,
			resend_delay,
			flags,
			delay,
			from,
			max_packet_size,
			signature,
			payload,
		})
	}

	/// Verifies a decoded packet against the sender's destination. Packets
	/// with no signature-requiring flag set are accepted unconditionally.
	/// SYNC packets additionally must carry the replay-guard proof keyed to
	/// `my_destination`.
	pub fn verify(&self, remote_destination: &Destination, my_destination: &Destination) -> bool {
		if !requires_signature(self.flags) {
			return true;
		}
		let signature = match &self.signature {
			Some(s) => s,
			None => return false,
		};
		let (buf, _) = match self.assemble(signature.len()) {
			Ok(v) => v,
			Err(_) => return false,
		};
		if !remote_destination.verify(&buf, signature) {
			return false;
		}
		if bit_is_set(self.flags, bit_index(FLAG_SYNC)) && self.nacks.len() == 8 {
			if self.nacks != replay_guard_words(my_destination) {
				return false;
			}
		}
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::SigType;

	fn sync_packet(local: &LocalDestination, remote: &Destination) -> Packet {
		Packet {
			send_stream_id: 0,
			receive_stream_id: 12345,
			sequence_num: 0,
			ack_through: 0,
			nacks: replay_guard_words(remote),
			resend_delay: 3,
			flags: FLAG_SYNC | FLAG_NO_ACK | FLAG_SIGNATURE_INCLUDED | FLAG_FROM_INCLUDED,
			delay: None,
			from: Some(local.destination.clone()),
			max_packet_size: None,
			signature: None,
			payload: b"first chunk".to_vec(),
		}
	}

	#[test]
	fn sync_packet_round_trips_and_verifies() {
		let local = LocalDestination::generate(SigType::Ed25519).unwrap();
		let remote = LocalDestination::generate(SigType::Ed25519).unwrap();
		let packet = sync_packet(&local, &remote.destination);

		let bytes = packet.encode(Some(&local)).unwrap();
		let decoded = Packet::decode(&bytes).unwrap();
		assert_eq!(decoded.payload, b"first chunk");
		assert_eq!(decoded.from.as_ref().unwrap(), &local.destination);
		assert!(decoded.verify(&local.destination, &remote.destination));
	}

	#[test]
	fn flipping_a_signed_byte_fails_verification() {
		let local = LocalDestination::generate(SigType::Ed25519).unwrap();
		let remote = LocalDestination::generate(SigType::Ed25519).unwrap();
		let packet = sync_packet(&local, &remote.destination);

		let mut bytes = packet.encode(Some(&local)).unwrap();
		let last = bytes.len() - 1;
		bytes[last] ^= 0xFF;
		let decoded = Packet::decode(&bytes).unwrap();
		assert!(!decoded.verify(&local.destination, &remote.destination));
	}

	#[test]
	fn replay_guard_mismatch_fails_verification() {
		let local = LocalDestination::generate(SigType::Ed25519).unwrap();
		let remote = LocalDestination::generate(SigType::Ed25519).unwrap();
		let other = LocalDestination::generate(SigType::Ed25519).unwrap();
		let mut packet = sync_packet(&local, &remote.destination);
		packet.nacks = replay_guard_words(&other.destination);

		let bytes = packet.encode(Some(&local)).unwrap();
		let decoded = Packet::decode(&bytes).unwrap();
		assert!(!decoded.verify(&local.destination, &remote.destination));
	}

	#[test]
	fn unsigned_packet_with_no_signature_flag_is_accepted_regardless() {
		let packet = Packet {
			send_stream_id: 1,
			receive_stream_id: 2,
			sequence_num: 5,
			ack_through: 4,
			nacks: vec![],
			resend_delay: 3,
			flags: 0,
			delay: None,
			from: None,
			max_packet_size: None,
			signature: None,
			payload: b"data".to_vec(),
		};
		let bytes = packet.encode(None).unwrap();
		let decoded = Packet::decode(&bytes).unwrap();
		let remote = LocalDestination::generate(SigType::Ed25519).unwrap().destination;
		let me = LocalDestination::generate(SigType::Ed25519).unwrap().destination;
		assert!(decoded.verify(&remote, &me));
	}

	#[test]
	fn pure_ack_is_not_ackable() {
		let packet = Packet {
			send_stream_id: 1,
			receive_stream_id: 2,
			sequence_num: 0,
			ack_through: 7,
			nacks: vec![3],
			resend_delay: 3,
			flags: 0,
			delay: None,
			from: None,
			max_packet_size: None,
			signature: None,
			payload: vec![],
		};
		assert!(!packet.is_ackable());
	}
}
