//! Session handshake and configuration (§4.I, steps 1-4): `GetDate` /
//! `SetDate`, the signed session-configuration blob, and `SessionStatus`.

use crate::bytes::{push_u16, push_u64, read_u16};
use crate::destination::LocalDestination;
use crate::error::I2PError;

use super::wire::encode_options_mapping;

pub const ROUTER_PROTOCOL_VERSION: &str = "0.9.65";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatusCode {
	Destroyed,
	Created,
	Updated,
	Invalid,
	Refused,
}

impl SessionStatusCode {
	pub fn from_code(code: u8) -> Result<SessionStatusCode, I2PError> {
		match code {
			0 => Ok(SessionStatusCode::Destroyed),
			1 => Ok(SessionStatusCode::Created),
			2 => Ok(SessionStatusCode::Updated),
			3 => Ok(SessionStatusCode::Invalid),
			4 => Ok(SessionStatusCode::Refused),
			other => Err(I2PError::SessionStatusError(format!("unknown status code {}", other))),
		}
	}

	pub fn is_success(self) -> bool {
		matches!(self, SessionStatusCode::Created | SessionStatusCode::Updated)
	}
}

/// `SessionStatus` payload: `u16 sessionId, u8 status`.
pub struct SessionStatus {
	pub session_id: u16,
	pub status: SessionStatusCode,
}

pub fn decode_session_status(payload: &[u8]) -> Result<SessionStatus, I2PError> {
	if payload.len() < 3 {
		return Err(I2PError::InvalidFraming("SessionStatus shorter than 3 bytes".into()));
	}
	let session_id = read_u16(&payload[0..2]).unwrap();
	let status = SessionStatusCode::from_code(payload[2])?;
	Ok(SessionStatus { session_id, status })
}

/// Builds the signed session-configuration blob sent with `CreateSession`:
/// `destination_bytes || options_mapping || u64 now_ms || signature`.
pub fn build_session_config(local: &LocalDestination, now_ms: u64) -> Result<Vec<u8>, I2PError> {
	let options = encode_options_mapping(&[
		("i2cp.fastReceive", "true"),
		("i2cp.leaseSetEncType", "4,0"),
	]);

	let mut unsigned = local.destination.to_bytes();
	unsigned.extend_from_slice(&options);
	push_u64(&mut unsigned, now_ms);

	let signature = local.sign(&unsigned)?;

	let mut out = unsigned;
	out.extend_from_slice(&signature);
	Ok(out)
}

/// `SetDate` carries nothing but a 64-bit epoch-ms wake signal.
pub fn decode_set_date(payload: &[u8]) -> Result<u64, I2PError> {
	crate::bytes::read_u64(payload).ok_or_else(|| I2PError::InvalidFraming("SetDate shorter than 8 bytes".into()))
}

/// `GetDate` carries the client's claimed protocol version as a length-
/// prefixed string (mirrors the options-mapping string convention).
pub fn build_get_date() -> Vec<u8> {
	let mut out = Vec::new();
	push_u16(&mut out, ROUTER_PROTOCOL_VERSION.len() as u16);
	out.extend_from_slice(ROUTER_PROTOCOL_VERSION.as_bytes());
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::SigType;

	#[test]
	fn session_status_round_trips_known_codes() {
		for (code, expected) in [
			(0u8, SessionStatusCode::Destroyed),
			(1, SessionStatusCode::Created),
			(2, SessionStatusCode::Updated),
			(3, SessionStatusCode::Invalid),
			(4, SessionStatusCode::Refused),
		] {
			let payload = [0x00, 0x2A, code];
			let status = decode_session_status(&payload).unwrap();
			assert_eq!(status.session_id, 0x2A);
			assert_eq!(status.status, expected);
		}
	}

	#[test]
	fn created_and_updated_are_success() {
		assert!(SessionStatusCode::Created.is_success());
		assert!(SessionStatusCode::Updated.is_success());
		assert!(!SessionStatusCode::Invalid.is_success());
		assert!(!SessionStatusCode::Refused.is_success());
	}

	#[test]
	fn unknown_status_code_is_an_error() {
		assert!(decode_session_status(&[0, 1, 99]).is_err());
	}

	#[test]
	fn session_config_ends_in_a_verifiable_signature() {
		let local = LocalDestination::generate(SigType::Ed25519).unwrap();
		let config = build_session_config(&local, 1_700_000_000_000).unwrap();
		let sig_len = SigType::Ed25519.signature_len();
		let (unsigned, signature) = config.split_at(config.len() - sig_len);
		assert!(local.destination.verify(unsigned, signature));
	}

	#[test]
	fn set_date_decodes_epoch_ms() {
		let mut payload = Vec::new();
		push_u64(&mut payload, 1_700_000_000_000);
		assert_eq!(decode_set_date(&payload).unwrap(), 1_700_000_000_000);
	}
}
