//! Uniform sign/verify/keygen over the six signature algorithms a destination
//! can carry, plus [`reddsa`], the one primitive this crate implements from
//! scratch rather than adapting from a RustCrypto crate.

mod dsa;
mod ecdsa;
mod eddsa;
mod reddsa;

pub use reddsa::RedDsa;

use crate::error::I2PError;

/// The six signature algorithms a [`crate::destination::Destination`] may carry.
///
/// RSA variants exist in the wider I2P signing-type space but are out of
/// scope for this crate (spec Non-goals); they are intentionally absent here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigType {
	DsaSha1,
	EcdsaP256,
	EcdsaP384,
	EcdsaP521,
	Ed25519,
	RedDsaEd25519,
}

impl SigType {
	/// The I2P wire type code for this signing algorithm, used in KEY
	/// certificates and in I2CP session configuration.
	pub fn code(self) -> u16 {
		match self {
			SigType::DsaSha1 => 0,
			SigType::EcdsaP256 => 1,
			SigType::EcdsaP384 => 2,
			SigType::EcdsaP521 => 3,
			SigType::Ed25519 => 7,
			SigType::RedDsaEd25519 => 11,
		}
	}

	pub fn from_code(code: u16) -> Result<SigType, I2PError> {
		match code {
			0 => Ok(SigType::DsaSha1),
			1 => Ok(SigType::EcdsaP256),
			2 => Ok(SigType::EcdsaP384),
			3 => Ok(SigType::EcdsaP521),
			7 => Ok(SigType::Ed25519),
			11 => Ok(SigType::RedDsaEd25519),
			other => Err(I2PError::UnsupportedSigType(other)),
		}
	}

	/// Whether a destination carrying this signing type uses a NULL
	/// certificate (true only for the legacy ElGamal+DSA pairing) or a KEY
	/// certificate (everything else).
	pub fn is_null_cert(self) -> bool {
		matches!(self, SigType::DsaSha1)
	}

	pub fn public_key_len(self) -> usize {
		match self {
			SigType::DsaSha1 => 128,
			SigType::EcdsaP256 => 64,
			SigType::EcdsaP384 => 96,
			SigType::EcdsaP521 => 132,
			SigType::Ed25519 => 32,
			SigType::RedDsaEd25519 => 32,
		}
	}

	pub fn private_key_len(self) -> usize {
		match self {
			SigType::DsaSha1 => 20,
			SigType::EcdsaP256 => 32,
			SigType::EcdsaP384 => 48,
			SigType::EcdsaP521 => 66,
			SigType::Ed25519 => 32,
			SigType::RedDsaEd25519 => 32,
		}
	}

	pub fn signature_len(self) -> usize {
		match self {
			SigType::DsaSha1 => 40,
			SigType::EcdsaP256 => 64,
			SigType::EcdsaP384 => 96,
			SigType::EcdsaP521 => 132,
			SigType::Ed25519 => 64,
			SigType::RedDsaEd25519 => 64,
		}
	}
}

pub struct KeyPair {
	pub public: Vec<u8>,
	pub private: Vec<u8>,
}

/// Signs `data` with `private` under `sig_type`. For DSA-SHA1 this hashes
/// `data` with SHA-1 internally (the "packet" variant in spec terms); callers
/// needing the "payload" variant (SHA-256 pre-hash) do that themselves before
/// calling in, see [`crate::destination::Destination::verify_payload`].
pub fn sign(sig_type: SigType, private: &[u8], data: &[u8]) -> Result<Vec<u8>, I2PError> {
	match sig_type {
		SigType::DsaSha1 => dsa::sign(private, data),
		SigType::EcdsaP256 => ecdsa::sign_p256(private, data),
		SigType::EcdsaP384 => ecdsa::sign_p384(private, data),
		SigType::EcdsaP521 => ecdsa::sign_p521(private, data),
		SigType::Ed25519 => eddsa::sign(private, data),
		SigType::RedDsaEd25519 => reddsa::RedDsa::sign(private, data),
	}
}

pub fn verify(sig_type: SigType, public: &[u8], data: &[u8], sig: &[u8]) -> bool {
	match sig_type {
		SigType::DsaSha1 => dsa::verify(public, data, sig),
		SigType::EcdsaP256 => ecdsa::verify_p256(public, data, sig),
		SigType::EcdsaP384 => ecdsa::verify_p384(public, data, sig),
		SigType::EcdsaP521 => ecdsa::verify_p521(public, data, sig),
		SigType::Ed25519 => eddsa::verify(public, data, sig),
		SigType::RedDsaEd25519 => reddsa::RedDsa::verify(public, data, sig),
	}
}

pub fn generate(sig_type: SigType) -> Result<KeyPair, I2PError> {
	match sig_type {
		SigType::DsaSha1 => dsa::generate(),
		SigType::EcdsaP256 => ecdsa::generate_p256(),
		SigType::EcdsaP384 => ecdsa::generate_p384(),
		SigType::EcdsaP521 => ecdsa::generate_p521(),
		SigType::Ed25519 => eddsa::generate(),
		SigType::RedDsaEd25519 => reddsa::RedDsa::generate(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn roundtrip(sig_type: SigType) {
		let kp = generate(sig_type).expect("keygen");
		assert_eq!(kp.public.len(), sig_type.public_key_len());
		assert_eq!(kp.private.len(), sig_type.private_key_len());

		let data = b"the quick brown fox jumps over the lazy dog";
		let sig = sign(sig_type, &kp.private, data).expect("sign");
		assert_eq!(sig.len(), sig_type.signature_len());
		assert!(verify(sig_type, &kp.public, data, &sig));

		let mut mutated = sig.clone();
		mutated[0] ^= 0xFF;
		assert!(!verify(sig_type, &kp.public, data, &mutated));
	}

	#[test]
	fn dsa_sha1_roundtrip() {
		roundtrip(SigType::DsaSha1);
	}

	#[test]
	fn ecdsa_p256_roundtrip() {
		roundtrip(SigType::EcdsaP256);
	}

	#[test]
	fn ecdsa_p384_roundtrip() {
		roundtrip(SigType::EcdsaP384);
	}

	#[test]
	fn ecdsa_p521_roundtrip() {
		roundtrip(SigType::EcdsaP521);
	}

	#[test]
	fn ed25519_roundtrip() {
		roundtrip(SigType::Ed25519);
	}

	#[test]
	fn reddsa_roundtrip() {
		roundtrip(SigType::RedDsaEd25519);
	}

	#[test]
	fn code_round_trips() {
		for t in [
			SigType::DsaSha1,
			SigType::EcdsaP256,
			SigType::EcdsaP384,
			SigType::EcdsaP521,
			SigType::Ed25519,
			SigType::RedDsaEd25519,
		] {
			assert_eq!(SigType::from_code(t.code()).unwrap(), t);
		}
	}
}
