//! LeaseSet2 construction (§4.I): converting the router's `lease1` entries
//! (44 bytes, millisecond expirations) into the `lease2` form the client
//! signs and republishes, plus the encryption-key pair every leaseset
//! carries (a legacy ElGamal filler and the X25519 key actually used for
//! end-to-end encryption).

use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};

use super::wire::encode_options_mapping;
use crate::bytes::{push_u16, push_u32, read_u16, read_u32};
use crate::destination::{Destination, LocalDestination};
use crate::error::I2PError;

pub const ENC_TYPE_ELGAMAL: u16 = 0;
pub const ENC_TYPE_X25519: u16 = 4;

pub const FLAG_OFFLINE_SIG: u16 = 0x0001;
pub const FLAG_UNPUBLISHED: u16 = 0x0002;
pub const FLAG_ENCRYPT_WHEN_PUBLISHED: u16 = 0x0004;

const LEASE1_LEN: usize = 44;
const LEASE2_LEN: usize = 40;

/// A single tunnel lease in lease2 form: gateway, tunnel id, and an
/// expiration in whole seconds (lease1's is milliseconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease2 {
	pub gateway_hash: [u8; 32],
	pub tunnel_id: u32,
	pub expiration_sec: u32,
}

/// Converts one router-supplied lease1 entry into lease2. The only
/// conversion is the expiration unit: milliseconds truncated to seconds.
pub fn lease1_to_lease2(bytes: &[u8]) -> Result<Lease2, I2PError> {
	if bytes.len() < LEASE1_LEN {
		return Err(I2PError::InvalidFraming("lease1 entry shorter than 44 bytes".into()));
	}
	let mut gateway_hash = [0u8; 32];
	gateway_hash.copy_from_slice(&bytes[0..32]);
	let tunnel_id = read_u32(&bytes[32..36]).unwrap();
	let expiration_ms = crate::bytes::read_u64(&bytes[36..44]).unwrap();
	Ok(Lease2 {
		gateway_hash,
		tunnel_id,
		expiration_sec: (expiration_ms / 1000) as u32,
	})
}

/// Parses `count` consecutive 44-byte lease1 entries starting at `bytes`.
pub fn decode_lease1s(bytes: &[u8], count: u8) -> Result<Vec<Lease2>, I2PError> {
	let mut leases = Vec::with_capacity(count as usize);
	for i in 0..count as usize {
		let start = i * LEASE1_LEN;
		let end = start + LEASE1_LEN;
		if bytes.len() < end {
			return Err(I2PError::InvalidFraming("lease1 array shorter than declared count".into()));
		}
		leases.push(lease1_to_lease2(&bytes[start..end])?);
	}
	Ok(leases)
}

fn encode_lease2(lease: &Lease2, out: &mut Vec<u8>) {
	out.extend_from_slice(&lease.gateway_hash);
	push_u32(out, lease.tunnel_id);
	push_u32(out, lease.expiration_sec);
}

fn decode_lease2(bytes: &[u8]) -> Result<Lease2, I2PError> {
	if bytes.len() < LEASE2_LEN {
		return Err(I2PError::InvalidFraming("lease2 entry shorter than 40 bytes".into()));
	}
	let mut gateway_hash = [0u8; 32];
	gateway_hash.copy_from_slice(&bytes[0..32]);
	let tunnel_id = read_u32(&bytes[32..36]).unwrap();
	let expiration_sec = read_u32(&bytes[36..40]).unwrap();
	Ok(Lease2 {
		gateway_hash,
		tunnel_id,
		expiration_sec,
	})
}

/// An encryption key entry: `u16 type || u16 len || key`. Every leaseset
/// this crate builds carries exactly two -- ElGamal (legacy, unused for
/// actual encryption) and X25519 (the one routers use).
pub struct EncryptionKey {
	pub key_type: u16,
	pub public_key: Vec<u8>,
	pub private_key: Vec<u8>,
}

pub struct LeaseSet2 {
	pub destination: Destination,
	pub published_sec: u32,
	/// Relative to `published_sec`, not absolute -- 600 (10 minutes) fits a
	/// u16 where an absolute epoch timestamp would not.
	pub expires_sec: u16,
	pub flags: u16,
	pub encryption_keys: Vec<EncryptionKey>,
	pub leases: Vec<Lease2>,
	pub signature: Vec<u8>,
}

impl LeaseSet2 {
	/// Builds and signs a fresh leaseset from the router's current lease
	/// set, expiring 10 minutes from `now_sec`.
	pub fn build(local: &LocalDestination, leases: Vec<Lease2>, now_sec: u32) -> Result<LeaseSet2, I2PError> {
		let mut elgamal_public = vec![0u8; 256];
		OsRng.fill_bytes(&mut elgamal_public);
		let mut elgamal_private = vec![0u8; 256];
		OsRng.fill_bytes(&mut elgamal_private);

		let x25519_secret = StaticSecret::random_from_rng(OsRng);
		let x25519_public = PublicKey::from(&x25519_secret);

		let encryption_keys = vec![
			EncryptionKey {
				key_type: ENC_TYPE_ELGAMAL,
				public_key: elgamal_public,
				private_key: elgamal_private,
			},
			EncryptionKey {
				key_type: ENC_TYPE_X25519,
				public_key: x25519_public.as_bytes().to_vec(),
				private_key: x25519_secret.to_bytes().to_vec(),
			},
		];

		let mut leaseset = LeaseSet2 {
			destination: local.destination.clone(),
			published_sec: now_sec,
			expires_sec: 600,
			flags: 0,
			encryption_keys,
			leases,
			signature: Vec::new(),
		};
		let unsigned = leaseset.encode_unsigned();
		let mut to_sign = vec![0x03u8];
		to_sign.extend_from_slice(&unsigned);
		leaseset.signature = local.sign(&to_sign)?;
		Ok(leaseset)
	}

	fn encode_unsigned(&self) -> Vec<u8> {
		let mut out = self.destination.to_bytes();
		push_u32(&mut out, self.published_sec);
		push_u16(&mut out, self.expires_sec);
		push_u16(&mut out, self.flags);
		// offline signature omitted: FLAG_OFFLINE_SIG is never set (Non-goal).
		out.extend_from_slice(&encode_options_mapping(&[]));
		out.push(self.encryption_keys.len() as u8);
		for key in &self.encryption_keys {
			push_u16(&mut out, key.key_type);
			push_u16(&mut out, key.public_key.len() as u16);
			out.extend_from_slice(&key.public_key);
		}
		out.push(self.leases.len() as u8);
		for lease in &self.leases {
			encode_lease2(lease, &mut out);
		}
		out
	}

	/// `unsigned || signature || u8 key_count || [u16 type || u16 len ||
	/// private_key]+`, the full payload handed to `CreateLeaseSet2`.
	pub fn encode(&self) -> Vec<u8> {
		let mut out = self.encode_unsigned();
		out.extend_from_slice(&self.signature);
		out.push(self.encryption_keys.len() as u8);
		for key in &self.encryption_keys {
			push_u16(&mut out, key.key_type);
			push_u16(&mut out, key.private_key.len() as u16);
			out.extend_from_slice(&key.private_key);
		}
		out
	}

	/// Decodes a leaseset built by [`Self::encode`]. Not something a real
	/// router ever sends back to a client; kept for round-trip tests.
	pub fn decode(bytes: &[u8]) -> Result<LeaseSet2, I2PError> {
		let destination = Destination::parse(bytes)?;
		let mut cursor = destination.byte_length();
		let sig_len = destination.sig_type.signature_len();

		let published_sec = read_u32(&bytes[cursor..cursor + 4])
			.ok_or_else(|| I2PError::InvalidFraming("leaseset truncated at published".into()))?;
		cursor += 4;
		let expires_sec = read_u16(&bytes[cursor..cursor + 2])
			.ok_or_else(|| I2PError::InvalidFraming("leaseset truncated at expires".into()))?;
		cursor += 2;
		let flags = read_u16(&bytes[cursor..cursor + 2])
			.ok_or_else(|| I2PError::InvalidFraming("leaseset truncated at flags".into()))?;
		cursor += 2;
		if flags & FLAG_OFFLINE_SIG != 0 {
			return Err(I2PError::InvalidFraming("offline signatures are unsupported".into()));
		}

		let (_options, consumed) = super::wire::decode_options_mapping(&bytes[cursor..])?;
		cursor += consumed;

		let key_count = *bytes
			.get(cursor)
			.ok_or_else(|| I2PError::InvalidFraming("leaseset truncated at key count".into()))?;
		cursor += 1;
		let mut encryption_keys = Vec::new();
		for _ in 0..key_count {
			let key_type = read_u16(&bytes[cursor..cursor + 2]).unwrap();
			cursor += 2;
			let len = read_u16(&bytes[cursor..cursor + 2]).unwrap() as usize;
			cursor += 2;
			let public_key = bytes[cursor..cursor + len].to_vec();
			cursor += len;
			encryption_keys.push(EncryptionKey {
				key_type,
				public_key,
				private_key: Vec::new(),
			});
		}

		let lease_count = *bytes
			.get(cursor)
			.ok_or_else(|| I2PError::InvalidFraming("leaseset truncated at lease count".into()))?;
		cursor += 1;
		let mut leases = Vec::new();
		for _ in 0..lease_count {
			leases.push(decode_lease2(&bytes[cursor..cursor + LEASE2_LEN])?);
			cursor += LEASE2_LEN;
		}

		if bytes.len() < cursor + sig_len {
			return Err(I2PError::InvalidFraming("leaseset truncated at signature".into()));
		}
		let signature = bytes[cursor..cursor + sig_len].to_vec();
		cursor += sig_len;

		let mut to_verify = vec![0x03u8];
		to_verify.extend_from_slice(&bytes[..cursor - sig_len]);
		if !destination.verify(&to_verify, &signature) {
			return Err(I2PError::VerificationFailed);
		}

		Ok(LeaseSet2 {
			destination,
			published_sec,
			expires_sec,
			flags,
			encryption_keys,
			leases,
			signature,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::SigType;

	fn sample_lease1(tunnel_id: u32, expiration_ms: u64) -> Vec<u8> {
		let mut out = vec![0x11u8; 32];
		push_u32(&mut out, tunnel_id);
		crate::bytes::push_u64(&mut out, expiration_ms);
		out
	}

	#[test]
	fn lease1_to_lease2_truncates_ms_to_sec() {
		let lease1 = sample_lease1(7, 12_345_678);
		let lease2 = lease1_to_lease2(&lease1).unwrap();
		assert_eq!(lease2.tunnel_id, 7);
		assert_eq!(lease2.expiration_sec, 12_345);
		assert_eq!(lease2.gateway_hash, [0x11u8; 32]);
	}

	#[test]
	fn decode_lease1s_reads_declared_count() {
		let mut bytes = sample_lease1(1, 1000);
		bytes.extend(sample_lease1(2, 2000));
		let leases = decode_lease1s(&bytes, 2).unwrap();
		assert_eq!(leases.len(), 2);
		assert_eq!(leases[0].tunnel_id, 1);
		assert_eq!(leases[1].tunnel_id, 2);
	}

	#[test]
	fn build_and_decode_round_trips() {
		let local = LocalDestination::generate(SigType::Ed25519).unwrap();
		let leases = vec![Lease2 {
			gateway_hash: [0x22u8; 32],
			tunnel_id: 42,
			expiration_sec: 1_700_000_000,
		}];
		let leaseset = LeaseSet2::build(&local, leases, 1_699_999_000).unwrap();
		let encoded = leaseset.encode();

		let decoded = LeaseSet2::decode(&encoded).unwrap();
		assert_eq!(decoded.destination, local.destination);
		assert_eq!(decoded.published_sec, 1_699_999_000);
		assert_eq!(decoded.expires_sec, 600);
		assert_eq!(decoded.leases.len(), 1);
		assert_eq!(decoded.leases[0].tunnel_id, 42);
		assert_eq!(decoded.encryption_keys.len(), 2);
		assert_eq!(decoded.encryption_keys[0].key_type, ENC_TYPE_ELGAMAL);
		assert_eq!(decoded.encryption_keys[1].key_type, ENC_TYPE_X25519);
		assert_eq!(decoded.encryption_keys[1].public_key.len(), 32);
	}

	#[test]
	fn tampered_leaseset_fails_verification() {
		let local = LocalDestination::generate(SigType::Ed25519).unwrap();
		let leaseset = LeaseSet2::build(&local, vec![], 1_700_000_000).unwrap();
		let mut encoded = leaseset.encode();
		// Flip a byte inside the signed (destination) region, not the
		// trailing private-key section decode() never inspects.
		encoded[0] ^= 0xFF;
		assert!(matches!(LeaseSet2::decode(&encoded), Err(I2PError::VerificationFailed)));
	}
}
