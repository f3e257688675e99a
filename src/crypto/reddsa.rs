//! RedDSA over Ed25519, hand-implemented directly against `curve25519-dalek`
//! primitives rather than adapted from a signing crate -- this is the one
//! algorithm here with no ready-made RustCrypto equivalent, since it's a
//! synthetic-nonce Schnorr variant rather than plain Ed25519.
//!
//! Scalar/point math follows `curve25519-dalek`'s canonical little-endian
//! encodings throughout; the 64-byte signature is `R || S` with both halves
//! little-endian, matching the library's native `to_bytes()` output.

use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha512};

use super::KeyPair;
use crate::error::I2PError;

const DOMAIN: &[u8] = b"I2P_Red25519H(x)";

/// `H*(prefix1, prefix2, msg)`: the domain-separated hash-to-scalar used for
/// both nonce derivation and the Fiat-Shamir challenge.
fn hstar(prefix1: &[u8], prefix2: &[u8], msg: &[u8]) -> Scalar {
	let mut hasher = Sha512::new();
	hasher.update(DOMAIN);
	hasher.update(prefix1);
	hasher.update(prefix2);
	let len = msg.len() as u16;
	hasher.update([(len & 0xff) as u8, (len >> 8) as u8]);
	hasher.update(msg);
	let digest = hasher.finalize();
	let mut wide = [0u8; 64];
	wide.copy_from_slice(&digest);
	Scalar::from_bytes_mod_order_wide(&wide)
}

fn expand_scalar(seed: &[u8]) -> Result<Scalar, I2PError> {
	if seed.len() != 32 {
		return Err(I2PError::InvalidDestination(format!(
			"RedDSA private key must be 32 bytes, got {}",
			seed.len()
		)));
	}
	let mut hasher = Sha512::new();
	hasher.update(seed);
	let h = hasher.finalize();
	let mut s = [0u8; 32];
	s.copy_from_slice(&h[..32]);
	s[0] &= 248;
	s[31] &= 63;
	s[31] |= 64;
	Ok(Scalar::from_bytes_mod_order(s))
}

pub struct RedDsa;

impl RedDsa {
	pub fn generate() -> Result<KeyPair, I2PError> {
		let mut seed = [0u8; 32];
		OsRng.fill_bytes(&mut seed);
		let s = expand_scalar(&seed)?;
		let vk = (ED25519_BASEPOINT_POINT * s).compress();
		Ok(KeyPair {
			public: vk.as_bytes().to_vec(),
			private: seed.to_vec(),
		})
	}

	pub fn sign(private: &[u8], msg: &[u8]) -> Result<Vec<u8>, I2PError> {
		let s = expand_scalar(private)?;
		let vk = (ED25519_BASEPOINT_POINT * s).compress();

		let mut t = [0u8; 80];
		OsRng.fill_bytes(&mut t);

		let r = hstar(&t, vk.as_bytes(), msg);
		let big_r = (ED25519_BASEPOINT_POINT * r).compress();
		let c = hstar(big_r.as_bytes(), vk.as_bytes(), msg);
		let s_scalar = r + c * s;

		let mut out = Vec::with_capacity(64);
		out.extend_from_slice(big_r.as_bytes());
		out.extend_from_slice(s_scalar.as_bytes());
		Ok(out)
	}

	pub fn verify(public: &[u8], msg: &[u8], sig: &[u8]) -> bool {
		if public.len() != 32 || sig.len() != 64 {
			return false;
		}
		let vk_bytes: [u8; 32] = public.try_into().unwrap();
		let vk_point = match CompressedEdwardsY(vk_bytes).decompress() {
			Some(p) => p,
			None => return false,
		};
		let r_bytes: [u8; 32] = sig[..32].try_into().unwrap();
		let big_r = match CompressedEdwardsY(r_bytes).decompress() {
			Some(p) => p,
			None => return false,
		};
		let s_bytes: [u8; 32] = sig[32..].try_into().unwrap();
		let s_scalar: Scalar = match Option::from(Scalar::from_canonical_bytes(s_bytes)) {
			Some(s) => s,
			None => return false,
		};

		let c = hstar(&r_bytes, &vk_bytes, msg);
		let check = ED25519_BASEPOINT_POINT * (-s_scalar) + big_r + vk_point * c;
		check.mul_by_cofactor() == curve25519_dalek::edwards::EdwardsPoint::identity()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	// No official Red25519 test vectors survived retrieval for this pack, so
	// coverage here is self-consistency: sign/verify round trip, tamper
	// detection, and that signing is randomized (synthetic nonce) rather than
	// deterministic.
	#[test]
	fn sign_then_verify() {
		let kp = RedDsa::generate().unwrap();
		let sig = RedDsa::sign(&kp.private, b"hello reddsa").unwrap();
		assert!(RedDsa::verify(&kp.public, b"hello reddsa", &sig));
	}

	#[test]
	fn tampered_message_fails() {
		let kp = RedDsa::generate().unwrap();
		let sig = RedDsa::sign(&kp.private, b"hello reddsa").unwrap();
		assert!(!RedDsa::verify(&kp.public, b"goodbye reddsa", &sig));
	}

	#[test]
	fn tampered_signature_byte_fails() {
		let kp = RedDsa::generate().unwrap();
		let mut sig = RedDsa::sign(&kp.private, b"hello reddsa").unwrap();
		sig[0] ^= 0x01;
		assert!(!RedDsa::verify(&kp.public, b"hello reddsa", &sig));
	}

	#[test]
	fn signatures_are_randomized() {
		let kp = RedDsa::generate().unwrap();
		let sig1 = RedDsa::sign(&kp.private, b"hello reddsa").unwrap();
		let sig2 = RedDsa::sign(&kp.private, b"hello reddsa").unwrap();
		assert_ne!(sig1, sig2);
		assert!(RedDsa::verify(&kp.public, b"hello reddsa", &sig1));
		assert!(RedDsa::verify(&kp.public, b"hello reddsa", &sig2));
	}

	#[test]
	fn oversized_s_is_rejected() {
		let kp = RedDsa::generate().unwrap();
		let mut sig = RedDsa::sign(&kp.private, b"hello reddsa").unwrap();
		sig[63] = 0xFF; // near-certainly pushes S past the group order L
		assert!(!RedDsa::verify(&kp.public, b"hello reddsa", &sig));
	}
}
