//! Binary router-control framing (§4.I): a one-byte protocol prelude sent
//! once after connect, then repeated `u32 BE length || u8 type || payload`
//! messages. Kept separate from [`super::client`] so the framing itself can
//! be tested without a socket.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::bytes::{push_u16, push_u32, read_u16, read_u32};
use crate::error::I2PError;

/// Sent once, immediately after the TCP connection is established.
pub const PROTOCOL_PRELUDE: u8 = 0x2A;

/// Serializes the I2P type-mapping format: `u16 total_len || (u16 len ||
/// key || "=" || u16 len || value || ";")*`, entries sorted by key (§4.I).
/// Shared by session configuration and leaseset2's (always-empty) options.
pub fn encode_options_mapping(entries: &[(&str, &str)]) -> Vec<u8> {
	let mut sorted = entries.to_vec();
	sorted.sort_by(|a, b| a.0.cmp(b.0));

	let mut body = Vec::new();
	for (key, value) in sorted {
		push_u16(&mut body, key.len() as u16);
		body.extend_from_slice(key.as_bytes());
		body.push(b'=');
		push_u16(&mut body, value.len() as u16);
		body.extend_from_slice(value.as_bytes());
		body.push(b';');
	}

	let mut out = Vec::with_capacity(2 + body.len());
	push_u16(&mut out, body.len() as u16);
	out.extend_from_slice(&body);
	out
}

/// Parses an options mapping, returning the decoded entries and the number
/// of bytes consumed (`2 + total_len`).
pub fn decode_options_mapping(buf: &[u8]) -> Result<(Vec<(String, String)>, usize), I2PError> {
	let total_len = read_u16(buf.get(0..2).ok_or_else(|| {
		I2PError::InvalidFraming("options mapping truncated before length".into())
	})?)
	.unwrap() as usize;
	let mut cursor = 2;
	let end = cursor + total_len;
	if buf.len() < end {
		return Err(I2PError::InvalidFraming("options mapping shorter than declared length".into()));
	}

	let mut entries = Vec::new();
	while cursor < end {
		let key_len = read_u16(&buf[cursor..cursor + 2])
			.ok_or_else(|| I2PError::InvalidFraming("truncated options key length".into()))?
			as usize;
		cursor += 2;
		let key = String::from_utf8_lossy(&buf[cursor..cursor + key_len]).into_owned();
		cursor += key_len;
		if buf.get(cursor) != Some(&b'=') {
			return Err(I2PError::InvalidFraming("options entry missing '='".into()));
		}
		cursor += 1;
		let value_len = read_u16(&buf[cursor..cursor + 2])
			.ok_or_else(|| I2PError::InvalidFraming("truncated options value length".into()))?
			as usize;
		cursor += 2;
		let value = String::from_utf8_lossy(&buf[cursor..cursor + value_len]).into_owned();
		cursor += value_len;
		if buf.get(cursor) != Some(&b';') {
			return Err(I2PError::InvalidFraming("options entry missing ';'".into()));
		}
		cursor += 1;
		entries.push((key, value));
	}

	Ok((entries, end))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
	CreateSession,
	SendMessage,
	MessagePayload,
	SessionStatus,
	MessageStatus,
	GetDate,
	SetDate,
	HostLookup,
	HostReply,
	Disconnect,
	RequestVariableLeaseSet,
	CreateLeaseSet2,
}

impl MessageType {
	pub fn code(self) -> u8 {
		match self {
			MessageType::CreateSession => 1,
			MessageType::SendMessage => 5,
			MessageType::MessagePayload => 31,
			MessageType::SessionStatus => 20,
			MessageType::MessageStatus => 22,
			MessageType::GetDate => 32,
			MessageType::SetDate => 33,
			MessageType::HostLookup => 38,
			MessageType::HostReply => 39,
			MessageType::Disconnect => 30,
			MessageType::RequestVariableLeaseSet => 37,
			MessageType::CreateLeaseSet2 => 41,
		}
	}

	pub fn from_code(code: u8) -> Option<MessageType> {
		match code {
			1 => Some(MessageType::CreateSession),
			5 => Some(MessageType::SendMessage),
			31 => Some(MessageType::MessagePayload),
			20 => Some(MessageType::SessionStatus),
			22 => Some(MessageType::MessageStatus),
			32 => Some(MessageType::GetDate),
			33 => Some(MessageType::SetDate),
			38 => Some(MessageType::HostLookup),
			39 => Some(MessageType::HostReply),
			30 => Some(MessageType::Disconnect),
			37 => Some(MessageType::RequestVariableLeaseSet),
			41 => Some(MessageType::CreateLeaseSet2),
			_ => None,
		}
	}
}

/// A decoded router-control frame: type code plus raw payload. Unknown type
/// codes are preserved as `None` with their raw numeric code kept on the
/// wire side (the caller logs and skips them, per §4.I).
pub struct Frame {
	pub message_type: Option<MessageType>,
	pub raw_type: u8,
	pub payload: Vec<u8>,
}

/// Encodes `message_type || payload` into a length-prefixed frame.
pub fn encode_frame(message_type: MessageType, payload: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(5 + payload.len());
	push_u32(&mut out, (1 + payload.len()) as u32);
	out.push(message_type.code());
	out.extend_from_slice(payload);
	out
}

/// Parses one frame out of a buffer that starts exactly at a frame boundary.
/// Returns `None` if `buf` doesn't yet hold a complete frame.
pub fn decode_frame(buf: &[u8]) -> Result<Option<(Frame, usize)>, I2PError> {
	if buf.len() < 5 {
		return Ok(None);
	}
	let len = read_u32(&buf[0..4]).ok_or_else(|| I2PError::InvalidFraming("truncated frame length".into()))? as usize;
	if len == 0 {
		return Err(I2PError::InvalidFraming("zero-length frame has no type byte".into()));
	}
	if buf.len() < 4 + len {
		return Ok(None);
	}
	let raw_type = buf[4];
	let payload = buf[5..4 + len].to_vec();
	Ok(Some((
		Frame {
			message_type: MessageType::from_code(raw_type),
			raw_type,
			payload,
		},
		4 + len,
	)))
}

/// Writes the one-time protocol prelude byte. Call exactly once, right after
/// connecting, before any framed message.
pub async fn write_prelude<W: AsyncWriteExt + Unpin>(writer: &mut W) -> Result<(), I2PError> {
	writer.write_all(&[PROTOCOL_PRELUDE]).await?;
	Ok(())
}

pub async fn write_frame<W: AsyncWriteExt + Unpin>(
	writer: &mut W,
	message_type: MessageType,
	payload: &[u8],
) -> Result<(), I2PError> {
	writer.write_all(&encode_frame(message_type, payload)).await?;
	Ok(())
}

/// Reads exactly one frame from `reader`, blocking until the length prefix
/// and full payload have arrived.
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Frame, I2PError> {
	let mut len_and_type = [0u8; 5];
	reader.read_exact(&mut len_and_type).await?;
	let len = read_u32(&len_and_type[0..4]).unwrap() as usize;
	if len == 0 {
		return Err(I2PError::InvalidFraming("zero-length frame has no type byte".into()));
	}
	let raw_type = len_and_type[4];
	let mut payload = vec![0u8; len - 1];
	reader.read_exact(&mut payload).await?;
	Ok(Frame {
		message_type: MessageType::from_code(raw_type),
		raw_type,
		payload,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn message_type_codes_match_spec_table() {
		let pairs = [
			(MessageType::GetDate, 32),
			(MessageType::SetDate, 33),
			(MessageType::CreateSession, 1),
			(MessageType::SessionStatus, 20),
			(MessageType::RequestVariableLeaseSet, 37),
			(MessageType::CreateLeaseSet2, 41),
			(MessageType::SendMessage, 5),
			(MessageType::MessagePayload, 31),
			(MessageType::MessageStatus, 22),
			(MessageType::HostLookup, 38),
			(MessageType::HostReply, 39),
			(MessageType::Disconnect, 30),
		];
		for (ty, code) in pairs {
			assert_eq!(ty.code(), code);
			assert_eq!(MessageType::from_code(code), Some(ty));
		}
	}

	#[test]
	fn unknown_type_code_decodes_to_none_but_keeps_raw() {
		assert_eq!(MessageType::from_code(255), None);
		let mut buf = Vec::new();
		push_u32(&mut buf, 2);
		buf.push(255);
		buf.push(0xAB);
		let (frame, consumed) = decode_frame(&buf).unwrap().unwrap();
		assert!(frame.message_type.is_none());
		assert_eq!(frame.raw_type, 255);
		assert_eq!(frame.payload, vec![0xAB]);
		assert_eq!(consumed, buf.len());
	}

	#[test]
	fn decode_frame_round_trips_with_encode() {
		let encoded = encode_frame(MessageType::GetDate, b"0.9.65");
		let (frame, consumed) = decode_frame(&encoded).unwrap().unwrap();
		assert_eq!(frame.message_type, Some(MessageType::GetDate));
		assert_eq!(frame.payload, b"0.9.65");
		assert_eq!(consumed, encoded.len());
	}

	#[test]
	fn decode_frame_reports_incomplete_buffers() {
		let encoded = encode_frame(MessageType::GetDate, b"0.9.65");
		assert!(decode_frame(&encoded[..encoded.len() - 1]).unwrap().is_none());
		assert!(decode_frame(&encoded[..3]).unwrap().is_none());
	}

	#[test]
	fn options_mapping_sorts_by_key_and_round_trips() {
		let encoded = encode_options_mapping(&[
			("i2cp.leaseSetEncType", "4,0"),
			("i2cp.fastReceive", "true"),
		]);
		let (decoded, consumed) = decode_options_mapping(&encoded).unwrap();
		assert_eq!(consumed, encoded.len());
		assert_eq!(
			decoded,
			vec![
				("i2cp.fastReceive".to_string(), "true".to_string()),
				("i2cp.leaseSetEncType".to_string(), "4,0".to_string()),
			]
		);
	}

	#[test]
	fn empty_options_mapping_round_trips() {
		let encoded = encode_options_mapping(&[]);
		assert_eq!(encoded, vec![0, 0]);
		let (decoded, consumed) = decode_options_mapping(&encoded).unwrap();
		assert!(decoded.is_empty());
		assert_eq!(consumed, 2);
	}
}
