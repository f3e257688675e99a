//! Plain Ed25519, via `ed25519-dalek`. The RedDSA variant in [`super::reddsa`]
//! reuses the same curve but is a distinct, from-scratch scheme.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use super::KeyPair;
use crate::error::I2PError;

pub fn generate() -> Result<KeyPair, I2PError> {
	let signing = SigningKey::generate(&mut OsRng);
	Ok(KeyPair {
		public: signing.verifying_key().to_bytes().to_vec(),
		private: signing.to_bytes().to_vec(),
	})
}

pub fn sign(private: &[u8], data: &[u8]) -> Result<Vec<u8>, I2PError> {
	let bytes: [u8; 32] = private
		.try_into()
		.map_err(|_| I2PError::InvalidDestination("Ed25519 private key must be 32 bytes".into()))?;
	let signing = SigningKey::from_bytes(&bytes);
	let sig: Signature = signing.sign(data);
	Ok(sig.to_bytes().to_vec())
}

pub fn verify(public: &[u8], data: &[u8], sig: &[u8]) -> bool {
	let pub_bytes: [u8; 32] = match public.try_into() {
		Ok(b) => b,
		Err(_) => return false,
	};
	let verifying = match VerifyingKey::from_bytes(&pub_bytes) {
		Ok(v) => v,
		Err(_) => return false,
	};
	let sig_bytes: [u8; 64] = match sig.try_into() {
		Ok(b) => b,
		Err(_) => return false,
	};
	let signature = Signature::from_bytes(&sig_bytes);
	verifying.verify(data, &signature).is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrip() {
		let kp = generate().unwrap();
		let sig = sign(&kp.private, b"payload").unwrap();
		assert!(verify(&kp.public, b"payload", &sig));
		assert!(!verify(&kp.public, b"other payload", &sig));
	}
}
