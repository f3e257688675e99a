//! DSA-SHA1 over a fixed 1024-bit group, per spec: the group parameters are
//! constants, not part of the key material. Implemented directly over
//! `num-bigint-dig` modular exponentiation rather than through an opaque DSA
//! crate, matching [`super::RedDsa`]'s from-scratch treatment of its curve.

use num_bigint_dig::{BigUint, RandBigInt};
use rand::rngs::OsRng;
use sha1::{Digest as Sha1Digest, Sha1};

use super::KeyPair;
use crate::error::I2PError;

const P_HEX: &str = "8DF2A494492276AA3D25759BB06869CBEAC0D83AFB8D0CF7CBB8324F0D7882E5D0762FC5B7210EAFC2E9ADAC32AB7AAC49693DFBF83724C2EC0736EE31C80291";
const Q_HEX: &str = "C773218C737EC8EE993B4F2DED30F48EDACE915F";
const G_HEX: &str = concat!(
	"626D027839EA0A13413163A55B4CB500299D5522956CEFCB3BFF10F399CE2C2E71CB9DE5FA24BABF58E5B7952192",
	"5C9CC42E9F6F464B088CC572AF53E6D78802"
);

fn group() -> (BigUint, BigUint, BigUint) {
	let p = BigUint::parse_bytes(P_HEX.as_bytes(), 16).expect("fixed DSA p");
	let q = BigUint::parse_bytes(Q_HEX.as_bytes(), 16).expect("fixed DSA q");
	let g = BigUint::parse_bytes(G_HEX.as_bytes(), 16).expect("fixed DSA g");
	(p, q, g)
}

fn sha1_as_biguint(data: &[u8], q: &BigUint) -> BigUint {
	let mut hasher = Sha1::new();
	hasher.update(data);
	let digest = hasher.finalize();
	BigUint::from_bytes_be(&digest) % q
}

pub fn generate() -> Result<KeyPair, I2PError> {
	let (p, q, g) = group();
	let mut rng = OsRng;
	let x = rng.gen_biguint_below(&q);
	let y = g.modpow(&x, &p);

	Ok(KeyPair {
		public: pad_to(&y.to_bytes_be(), 128),
		private: pad_to(&x.to_bytes_be(), 20),
	})
}

fn pad_to(bytes: &[u8], len: usize) -> Vec<u8> {
	if bytes.len() >= len {
		return bytes[bytes.len() - len..].to_vec();
	}
	let mut out = vec![0u8; len - bytes.len()];
	out.extend_from_slice(bytes);
	out
}

pub fn sign(private: &[u8], data: &[u8]) -> Result<Vec<u8>, I2PError> {
	if private.len() != 20 {
		return Err(I2PError::InvalidDestination(format!(
			"DSA private key must be 20 bytes, got {}",
			private.len()
		)));
	}
	let (p, q, g) = group();
	let x = BigUint::from_bytes_be(private);
	let h = sha1_as_biguint(data, &q);
	let mut rng = OsRng;

	loop {
		let k = rng.gen_biguint_below(&q);
		if k == BigUint::from(0u8) {
			continue;
		}
		let r = g.modpow(&k, &p) % &q;
		if r == BigUint::from(0u8) {
			continue;
		}
		let k_inv = match mod_inverse(&k, &q) {
			Some(v) => v,
			None => continue,
		};
		let s = (k_inv * (&h + &x * &r)) % &q;
		if s == BigUint::from(0u8) {
			continue;
		}
		let mut out = pad_to(&r.to_bytes_be(), 20);
		out.extend_from_slice(&pad_to(&s.to_bytes_be(), 20));
		return Ok(out);
	}
}

pub fn verify(public: &[u8], data: &[u8], sig: &[u8]) -> bool {
	if public.len() != 128 || sig.len() != 40 {
		return false;
	}
	let (p, q, g) = group();
	let y = BigUint::from_bytes_be(public);
	let r = BigUint::from_bytes_be(&sig[..20]);
	let s = BigUint::from_bytes_be(&sig[20..]);
	if r == BigUint::from(0u8) || r >= q || s == BigUint::from(0u8) || s >= q {
		return false;
	}
	let w = match mod_inverse(&s, &q) {
		Some(v) => v,
		None => return false,
	};
	let h = sha1_as_biguint(data, &q);
	let u1 = (&h * &w) % &q;
	let u2 = (&r * &w) % &q;
	let v = ((g.modpow(&u1, &p) * y.modpow(&u2, &p)) % &p) % &q;
	v == r
}

/// Extended Euclidean algorithm; `q` is prime so this always succeeds for
/// `0 < a < q`, but callers still treat a `None` (a == 0) as verification
/// failure rather than panicking.
fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
	use num_bigint_dig::BigInt;
	use num_bigint_dig::ModInverse;
	let a_signed = BigInt::from_biguint(num_bigint_dig::Sign::Plus, a.clone());
	let m_signed = BigInt::from_biguint(num_bigint_dig::Sign::Plus, m.clone());
	a_signed.mod_inverse(&m_signed).map(|v| {
		let (_, bytes) = v.to_bytes_be();
		BigUint::from_bytes_be(&bytes)
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn group_constants_parse() {
		let (p, q, g) = group();
		assert_eq!(p.to_bytes_be().len(), 128);
		assert_eq!(q.to_bytes_be().len(), 20);
		assert!(g < p);
	}

	#[test]
	fn sign_then_verify() {
		let kp = generate().unwrap();
		let sig = sign(&kp.private, b"hello destination").unwrap();
		assert!(verify(&kp.public, b"hello destination", &sig));
		assert!(!verify(&kp.public, b"tampered", &sig));
	}
}
