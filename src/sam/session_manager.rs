//! Primary-session / subsession split (§4.H, §6): a single `SESSION CREATE
//! STYLE=PRIMARY` control socket, with named `STREAM`/`DATAGRAM`/`RAW`
//! subsessions layered on via `SESSION ADD`. Subsessions hold a back-index
//! (their nickname) into the primary session rather than a back-pointer, so
//! there's no `Session <-> Subsession` reference cycle to break.

use anyhow::Result;
use dashmap::DashMap;
use rand::{distributions::Alphanumeric, Rng};
use std::net::SocketAddr;

use super::{
	DatagramSubsession, SamConnection, SessionStyle, parsers::sam_stream_status, parsers::sam_session_status,
};
use crate::error::I2PError;
use crate::net::I2pSocketAddr;
use crate::sam::sam_options::SAMOptions;

use super::Session;

pub struct SessionManager {
	/// the primary session which is created
	pub primary_session: Session,
	/// maps (app_name, style) -> subsession info
	subsessions: DashMap<(String, SessionStyle), SubSession>,
	sam_udp_addr: SocketAddr,
}

#[derive(Clone)]
pub struct SubSession {
	pub nickname: String,
	pub style: SessionStyle,
	pub listen_port: u16,
}

impl SessionManager {
	pub fn new(session: Session) -> SessionManager {
		SessionManager {
			primary_session: session,
			subsessions: DashMap::new(),
			sam_udp_addr: super::DEFAULT_UDP_FORWARD
				.parse()
				.expect("DEFAULT_UDP_FORWARD is a valid socket address"),
		}
	}

	/// Idempotent in `(app_name, style)`: returns the existing subsession if
	/// one was already added under this name and style, otherwise issues
	/// `SESSION ADD` and registers a new one.
	pub fn get_or_create_subsession(
		&self,
		app_name: &str,
		style: SessionStyle,
		listen_port: Option<u16>,
	) -> Result<SubSession> {
		let key = (app_name.to_string(), style);
		if let Some(existing) = self.subsessions.get(&key) {
			return Ok(existing.clone());
		}

		let nickname = self.rand_session_id();
		let listen_port = listen_port.unwrap_or(0);
		let mut add_session_msg = format!(
			"SESSION ADD STYLE={style} ID={nickname} {options}",
			style = style.string(),
			nickname = nickname,
			options = self.primary_session_options(),
		);
		match style {
			SessionStyle::Stream if listen_port != 0 => {
				add_session_msg.push_str(&format!("LISTEN_PORT={listen_port} "));
			}
			SessionStyle::Datagram | SessionStyle::Raw => {
				add_session_msg.push_str(&format!("PORT={listen_port} "));
			}
			_ => {}
		}
		add_session_msg.push('\n');

		let mut control = SamConnection::connect(self.primary_session.sam_api()?)?;
		control.send(add_session_msg, sam_session_status)?;

		let subsession = SubSession {
			nickname,
			style,
			listen_port,
		};
		self.subsessions.insert(key, subsession.clone());
		Ok(subsession)
	}

	/// Accepts one inbound stream on a STREAM subsession's accept pool,
	/// filtering per §4.H ("applications listening on port p must filter by
	/// TO_PORT == p") when the subsession was bound to a nonzero port.
	pub fn accept(&self, app_name: &str) -> Result<(super::StreamConnect, I2pSocketAddr)> {
		let key = (app_name.to_string(), SessionStyle::Stream);
		let subsession = self
			.subsessions
			.get(&key)
			.ok_or_else(|| I2PError::SAMInvalidId(app_name.to_string()))?
			.clone();

		let mut sam_conn = SamConnection::connect(self.primary_session.sam_api()?)?;
		let accept_stream_msg = format!(
			"STREAM ACCEPT ID={nickname} SILENT=false\n",
			nickname = subsession.nickname,
		);
		sam_conn.send(accept_stream_msg, sam_stream_status)?;
		let local_dest = sam_conn.naming_lookup("ME")?;
		let session = Session {
			sam: sam_conn,
			local_dest,
			nickname: subsession.nickname,
			shutdown_registration: None,
		};

		let forward = crate::sam::StreamForward::with_session(&session)?;
		loop {
			let (stream, addr) = forward.accept()?;
			if subsession.listen_port == 0 || stream.local_port == subsession.listen_port {
				return Ok((stream, addr));
			}
		}
	}

	/// Opens an outbound stream on a STREAM subsession.
	pub fn create_stream(
		&self,
		app_name: &str,
		destination: &str,
		from_port: u16,
		to_port: u16,
	) -> Result<super::StreamConnect> {
		let key = (app_name.to_string(), SessionStyle::Stream);
		let subsession = self
			.subsessions
			.get(&key)
			.ok_or_else(|| I2PError::SAMInvalidId(app_name.to_string()))?
			.clone();
		let mut sam_conn = SamConnection::connect(self.primary_session.sam_api()?)?;
		let local_dest = sam_conn.naming_lookup("ME")?;
		let session = Session {
			sam: sam_conn,
			local_dest,
			nickname: subsession.nickname,
			shutdown_registration: None,
		};
		super::StreamConnect::with_session_ports(&session, destination, from_port, to_port)
	}

	/// Binds the UDP socket backing a DATAGRAM or RAW subsession previously
	/// created via [`Self::get_or_create_subsession`].
	pub fn datagram_subsession(&self, app_name: &str, style: SessionStyle) -> Result<DatagramSubsession> {
		let key = (app_name.to_string(), style);
		let subsession = self
			.subsessions
			.get(&key)
			.ok_or_else(|| I2PError::SAMInvalidId(app_name.to_string()))?
			.clone();
		DatagramSubsession::new(
			subsession.listen_port,
			&subsession.nickname,
			matches!(style, SessionStyle::Datagram),
			self.sam_udp_addr,
		)
	}

	fn primary_session_options(&self) -> String {
		SAMOptions::default().options()
	}

	fn rand_session_id(&self) -> String {
		let suffix: String = rand::thread_rng()
			.sample_iter(&Alphanumeric)
			.take(16)
			.map(char::from)
			.collect();
		format!("sessid-{}", suffix)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sub_session_carries_requested_listen_port() {
		let sub = SubSession {
			nickname: "sessid-abc".to_string(),
			style: SessionStyle::Datagram,
			listen_port: 13,
		};
		assert_eq!(sub.listen_port, 13);
		assert_eq!(sub.style, SessionStyle::Datagram);
	}
}
