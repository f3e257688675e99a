//! ECDSA over the three NIST curves the destination format supports.
//!
//! Public keys are stored on the wire as raw `x || y` with no leading `0x04`
//! SEC1 tag (the tag is implied by the fixed per-curve length), so every
//! function here re-tags on the way into a RustCrypto type and strips the tag
//! on the way out.

use p256::ecdsa::{Signature as P256Sig, SigningKey as P256Signing, VerifyingKey as P256Verify};
use p384::ecdsa::{Signature as P384Sig, SigningKey as P384Signing, VerifyingKey as P384Verify};
use p521::ecdsa::{Signature as P521Sig, SigningKey as P521Signing, VerifyingKey as P521Verify};
use rand::rngs::OsRng;
use signature::{Signer, Verifier};

use super::KeyPair;
use crate::error::I2PError;

fn untagged_point(tagged: &[u8]) -> Vec<u8> {
	tagged[1..].to_vec()
}

fn tag_point(untagged: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(untagged.len() + 1);
	out.push(0x04);
	out.extend_from_slice(untagged);
	out
}

macro_rules! impl_curve {
	($generate:ident, $sign:ident, $verify:ident, $signing:ty, $verifying:ty, $sig:ty, $priv_len:expr) => {
		pub fn $generate() -> Result<KeyPair, I2PError> {
			let signing = <$signing>::random(&mut OsRng);
			let verifying: $verifying = *signing.verifying_key();
			let point = verifying.to_encoded_point(false);
			Ok(KeyPair {
				public: untagged_point(point.as_bytes()),
				private: signing.to_bytes().to_vec(),
			})
		}

		pub fn $sign(private: &[u8], data: &[u8]) -> Result<Vec<u8>, I2PError> {
			if private.len() != $priv_len {
				return Err(I2PError::InvalidDestination(format!(
					"ECDSA private key must be {} bytes, got {}",
					$priv_len,
					private.len()
				)));
			}
			let signing = <$signing>::from_bytes(private.into())
				.map_err(|e| I2PError::InvalidDestination(e.to_string()))?;
			let sig: $sig = signing.sign(data);
			Ok(sig.to_bytes().to_vec())
		}

		pub fn $verify(public: &[u8], data: &[u8], sig: &[u8]) -> bool {
			let tagged = tag_point(public);
			let verifying = match <$verifying>::from_sec1_bytes(&tagged) {
				Ok(v) => v,
				Err(_) => return false,
			};
			let signature = match <$sig>::from_slice(sig) {
				Ok(s) => s,
				Err(_) => return false,
			};
			verifying.verify(data, &signature).is_ok()
		}
	};
}

impl_curve!(
	generate_p256,
	sign_p256,
	verify_p256,
	P256Signing,
	P256Verify,
	P256Sig,
	32
);
impl_curve!(
	generate_p384,
	sign_p384,
	verify_p384,
	P384Signing,
	P384Verify,
	P384Sig,
	48
);
impl_curve!(
	generate_p521,
	sign_p521,
	verify_p521,
	P521Signing,
	P521Verify,
	P521Sig,
	66
);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn p256_roundtrip() {
		let kp = generate_p256().unwrap();
		assert_eq!(kp.public.len(), 64);
		assert_eq!(kp.private.len(), 32);
		let sig = sign_p256(&kp.private, b"payload").unwrap();
		assert!(verify_p256(&kp.public, b"payload", &sig));
		assert!(!verify_p256(&kp.public, b"other", &sig));
	}

	#[test]
	fn p384_roundtrip() {
		let kp = generate_p384().unwrap();
		assert_eq!(kp.public.len(), 96);
		let sig = sign_p384(&kp.private, b"payload").unwrap();
		assert!(verify_p384(&kp.public, b"payload", &sig));
	}

	#[test]
	fn p521_roundtrip() {
		let kp = generate_p521().unwrap();
		assert_eq!(kp.public.len(), 132);
		let sig = sign_p521(&kp.private, b"payload").unwrap();
		assert!(verify_p521(&kp.public, b"payload", &sig));
	}
}
