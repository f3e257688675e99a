use std::io;
use thiserror::Error as ThisError;

/// Kinds of I2P/SAM/I2CP errors
#[derive(Clone, Eq, PartialEq, Debug, ThisError)]
pub enum I2PError {
	/// Wraps io errors
	#[error("IO error occurred (is i2p running?): {0}")]
	Io(String),
	/// Wraps nom parser errors
	#[error("Failed to parse an I2P/SAM message")]
	MessageParsing,
	#[error("Failed to resolve an I2P address")]
	UnresolvableAddress,
	#[error("Invalid or unrecognized I2P/SAM message: {0}")]
	SAMInvalidMessage(String),
	#[error("Can't reach peer: {0}")]
	SAMCantReachPeer(String),
	#[error("Destination key not found: {0}")]
	SAMKeyNotFound(String),
	#[error("Peer not found: {0}")]
	SAMPeerNotFound(String),
	#[error("Duplicate peer destination: {0}")]
	SAMDuplicatedDest(String),
	#[error("Invalid destination key: {0}")]
	SAMInvalidKey(String),
	#[error("Invalid stream id: {0}")]
	SAMInvalidId(String),
	#[error("I2P/SAM Timeout: {0}")]
	SAMTimeout(String),
	#[error("Unknown I2P/SAM error: {0}")]
	SAMI2PError(String),
	#[error("I2P address isn't a valid b32 or b64 encoding: {0}")]
	BadAddressEncoding(String),
	#[error("Accept encountered error, and session was recreated. try operation again")]
	SessionRecreated,

	/// Malformed destination byte layout (too short, inconsistent lengths).
	#[error("Malformed destination: {0}")]
	InvalidDestination(String),
	/// Unknown or unsupported signature type code.
	#[error("Unsupported signature type: {0}")]
	UnsupportedSigType(u16),
	/// Signature/verification failed. Policy on what to do with this (drop vs. propagate)
	/// is the caller's, per spec: forged packets are dropped, not errored.
	#[error("Signature verification failed")]
	VerificationFailed,
	/// A SYNC packet's replay-guard nacks did not match SHA-256(local destination).
	#[error("Replay guard mismatch on SYNC packet")]
	ReplayGuardMismatch,
	/// Malformed stream-layer packet.
	#[error("Malformed stream packet: {0}")]
	InvalidPacket(String),
	/// A stream's outstanding packet was not acknowledged within the retry ceiling.
	#[error("Packet resend failed")]
	PacketResendFailed,
	/// A stream received RESET or was otherwise torn down out-of-band.
	#[error("Stream reset")]
	StreamReset,
	/// A name lookup exceeded its hard timeout.
	#[error("Lookup timeout for {0}")]
	LookupTimeout(String),
	/// Session bridge / router control handshake did not complete.
	#[error("Handshake failed: {0}")]
	HandshakeFailed(String),
	/// A SendMessage was rejected by the router with a non-success MessageStatus.
	#[error("Message delivery failed with status {0}")]
	MessageStatusFailed(u8),
	/// An I2CP SessionStatus reply was anything other than CREATED/UPDATED.
	#[error("Session status error: {0}")]
	SessionStatusError(String),
	/// Gzip payload framing was truncated or invalid.
	#[error("Invalid gzip datagram framing: {0}")]
	InvalidFraming(String),
}

impl From<io::Error> for I2PError {
	fn from(err: io::Error) -> I2PError {
		Self::Io(err.to_string())
	}
}

impl<E> From<nom::Err<E>> for I2PError {
	fn from(_err: nom::Err<E>) -> I2PError {
		Self::MessageParsing
	}
}
