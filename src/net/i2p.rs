use anyhow::Result;
use data_encoding::{Encoding, Specification};
use lazy_static::lazy_static;
use log::error;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::I2PError;

pub const B32_EXT: &str = ".b32.i2p";

lazy_static! {
	pub static ref BASE32_I2P: Encoding = {
		let mut spec = Specification::new();

		spec.symbols.push_str("abcdefghijklmnopqrstuvwxyz234567");
		spec.padding = None;
		spec.encoding().unwrap()
	};
}

lazy_static! {
	pub static ref BASE64_I2P: Encoding = {
		let mut spec = Specification::new();
		spec.symbols
			.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-~");
		spec.padding = Some('=');
		spec.encoding().unwrap()
	};
}

/// Pads a base64-i2p string with `=` to a multiple of 4 characters. The router
/// requires padding on input; many stored destinations elide it.
pub fn pad_base64(s: &str) -> String {
	let mut padded = s.to_string();
	while padded.len() % 4 != 0 {
		padded.push('=');
	}
	padded
}

/// Computes the `<base32(sha256(bytes))>.b32.i2p` short name for a destination's
/// canonical byte form.
pub fn short_name(bytes: &[u8]) -> String {
	let mut hasher = Sha256::new();
	hasher.update(bytes);
	let mut b32 = BASE32_I2P.encode(&hasher.finalize()[..]);
	b32.push_str(B32_EXT);
	b32
}

/// An I2P address, as a Destination, B32 address or hostname.
///
/// # Examples
///
/// Constructing from a hostname:
///
/// ```
/// use i2p::net::I2pAddr;
///
/// I2pAddr::new("example.i2p");
/// ```
///
/// Constructing from a B32 address:
///
/// ```
/// use i2p::net::I2pAddr;
///
/// I2pAddr::new("abcdefghijklmnopqrstuvwxyz234567abcdefghijklmnopqrst.b32.i2p");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct I2pAddr {
	inner: String,
}

impl I2pAddr {
	/// Creates a new I2p address from a given string.
	///
	/// # Examples
	///
	/// ```
	/// use i2p::net::I2pAddr;
	///
	/// let addr = I2pAddr::new("example.i2p");
	/// ```
	pub fn new(dest: &str) -> I2pAddr {
		I2pAddr {
			inner: dest.to_string(),
		}
	}

	/// Creates a new I2P address from a full base64 destination string. This
	/// will internally convert it to a common base32 addresse, using the
	/// b32.i2p extension.
	pub fn from_b64(dest: &str) -> Result<I2pAddr> {
		let padded = pad_base64(dest);
		let bin_data = BASE64_I2P.decode(padded.as_bytes()).map_err(|e| {
			error!("Base64 decoding error: {:?}", e);
			I2PError::BadAddressEncoding(dest.to_string())
		})?;
		Ok(I2pAddr {
			inner: short_name(&bin_data),
		})
	}

	/// Returns the String that makes up this address.
	///
	/// # Examples
	///
	/// ```
	/// use i2p::net::I2pAddr;
	///
	/// let addr = I2pAddr::new("example.i2p");
	/// assert_eq!(addr.string(), "example.i2p");
	/// ```
	pub fn string(&self) -> String {
		self.inner.clone()
	}
}

impl fmt::Display for I2pAddr {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		write!(fmt, "{}", self.inner)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pad_base64_adds_up_to_three_equals() {
		assert_eq!(pad_base64("AAAA"), "AAAA");
		assert_eq!(pad_base64("AAA"), "AAA=");
		assert_eq!(pad_base64("AA"), "AA==");
		assert_eq!(pad_base64("A"), "A===");
	}

	#[test]
	fn short_name_is_lowercase_base32_of_sha256() {
		let name = short_name(b"some destination bytes");
		assert!(name.ends_with(B32_EXT));
		let label = &name[..name.len() - B32_EXT.len()];
		assert!(label
			.chars()
			.all(|c| "abcdefghijklmnopqrstuvwxyz234567".contains(c)));
	}
}
