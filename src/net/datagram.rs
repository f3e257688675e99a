use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::error::I2PError;
use crate::net::{I2pAddr, I2pSocketAddr, ToI2pSocketAddrs};
use crate::sam::{DatagramSubsession, Session, SessionManager, SessionStyle, DEFAULT_API};

/// An I2P datagram socket (§4.H "Datagram subsessions"). Backed by a
/// DATAGRAM or RAW subsession's UDP forwarding socket: `Datagram`-style
/// sockets are repliable and carry sender identity, `Raw`-style sockets
/// accept from anyone and don't.
///
/// # Examples
///
/// ```no_run
/// use i2p::net::I2pDatagramSocket;
///
/// let socket = I2pDatagramSocket::bind("127.0.0.1:34254").expect("couldn't bind to address");
///
/// let mut buf = [0; 10];
/// let (amt, src) = socket.recv_from(&mut buf).expect("didn't receive data");
///
/// let buf = &mut buf[..amt];
/// buf.reverse();
/// socket.send_to(buf, &src).expect("couldn't send data");
/// ```
pub struct I2pDatagramSocket {
	manager: Arc<SessionManager>,
	app_name: String,
	style: SessionStyle,
	subsession: DatagramSubsession,
	peer: Mutex<Option<(String, u16)>>,
}

impl I2pDatagramSocket {
	/// Creates an I2P datagram socket from the given address. `addr`'s
	/// port becomes the subsession's listen port, used to filter inbound
	/// repliable datagrams by `TO_PORT` (§4.H).
	pub fn bind<A: ToI2pSocketAddrs>(addr: A) -> Result<I2pDatagramSocket> {
		I2pDatagramSocket::bind_via(DEFAULT_API, addr)
	}

	pub fn bind_via<A: ToSocketAddrs, B: ToI2pSocketAddrs>(
		sam_addr: A,
		addr: B,
	) -> Result<I2pDatagramSocket> {
		super::each_i2p_addr(sam_addr, addr, I2pDatagramSocket::bind_addr).map_err(|e| e.into())
	}

	fn bind_addr(sam_addr: &SocketAddr, addr: &I2pSocketAddr) -> Result<I2pDatagramSocket> {
		let session = Session::primary(sam_addr, "TRANSIENT")?;
		let manager = Arc::new(SessionManager::new(session));
		I2pDatagramSocket::bind_with_manager(
			manager,
			SessionStyle::Datagram,
			"datagram",
			Some(addr.port()),
		)
	}

	/// Binds a new DATAGRAM or RAW subsession atop an existing primary
	/// session's [`SessionManager`], named `app_name`. Several sockets may
	/// share one `manager` across different `app_name`s/styles.
	pub fn bind_with_manager(
		manager: Arc<SessionManager>,
		style: SessionStyle,
		app_name: &str,
		listen_port: Option<u16>,
	) -> Result<I2pDatagramSocket> {
		manager.get_or_create_subsession(app_name, style, listen_port)?;
		let subsession = manager.datagram_subsession(app_name, style)?;
		Ok(I2pDatagramSocket {
			manager,
			app_name: app_name.to_string(),
			style,
			subsession,
			peer: Mutex::new(None),
		})
	}

	/// Receives data from the socket. On success, returns the number of
	/// bytes read and the address from whence the data came.
	pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, I2pSocketAddr)> {
		loop {
			if let Some(dg) = self.subsession.recv(buf)? {
				return Self::deliver(buf, dg);
			}
		}
	}

	/// Receives data without removing it from the socket's queue.
	pub fn peek_from(&self, buf: &mut [u8]) -> Result<(usize, I2pSocketAddr)> {
		loop {
			if let Some(dg) = self.subsession.peek(buf)? {
				return Self::deliver(buf, dg);
			}
		}
	}

	/// Sends data on the socket to the given address.
	pub fn send_to<A: ToI2pSocketAddrs>(&self, buf: &[u8], addr: A) -> Result<usize> {
		let addr = addr
			.to_socket_addrs()?
			.next()
			.ok_or(I2PError::UnresolvableAddress)?;
		self.subsession
			.send(&addr.dest().string(), 0, addr.port(), buf)?;
		Ok(buf.len())
	}

	/// Returns the listen port (and the local destination's short name)
	/// this socket was bound with.
	pub fn local_addr(&self) -> Result<I2pSocketAddr> {
		Ok(I2pSocketAddr::new(
			I2pAddr::new(&self.manager.primary_session.local_dest),
			self.subsession.listen_port,
		))
	}

	pub fn try_clone(&self) -> Result<I2pDatagramSocket> {
		Ok(I2pDatagramSocket {
			manager: self.manager.clone(),
			app_name: self.app_name.clone(),
			style: self.style,
			subsession: self.subsession.try_clone()?,
			peer: Mutex::new(self.peer.lock().unwrap().clone()),
		})
	}

	/// Restricts `send`/`recv` to the given remote address.
	pub fn connect<A: ToI2pSocketAddrs>(&self, addr: A) -> Result<()> {
		self.connect_via(DEFAULT_API, addr)
	}

	pub fn connect_via<A: ToSocketAddrs, B: ToI2pSocketAddrs>(
		&self,
		sam_addr: A,
		addr: B,
	) -> Result<()> {
		super::each_i2p_addr(sam_addr, addr, |_sam_addr, addr| {
			*self.peer.lock().unwrap() = Some((addr.dest().string(), addr.port()));
			Ok(())
		})
	}

	/// Sends data to the address passed to [`Self::connect`].
	pub fn send(&self, buf: &[u8]) -> Result<usize> {
		let peer = self.peer.lock().unwrap().clone();
		let (dest, port) = peer.ok_or(I2PError::UnresolvableAddress)?;
		self.subsession.send(&dest, 0, port, buf)?;
		Ok(buf.len())
	}

	/// Receives data from the address passed to [`Self::connect`],
	/// discarding datagrams from anyone else.
	pub fn recv(&self, buf: &mut [u8]) -> Result<usize> {
		let peer = self.peer.lock().unwrap().clone();
		let (dest, _) = peer.ok_or(I2PError::UnresolvableAddress)?;
		loop {
			let (n, from) = self.recv_from(buf)?;
			if from.dest().string() == dest {
				return Ok(n);
			}
		}
	}

	/// Like [`Self::recv`] but leaves the datagram in the queue.
	pub fn peek(&self, buf: &mut [u8]) -> Result<usize> {
		let peer = self.peer.lock().unwrap().clone();
		let (dest, _) = peer.ok_or(I2PError::UnresolvableAddress)?;
		loop {
			let (n, from) = self.peek_from(buf)?;
			if from.dest().string() == dest {
				return Ok(n);
			}
		}
	}

	/// Copies a received datagram's payload into `buf` and resolves its
	/// sender into an [`I2pSocketAddr`].
	fn deliver(buf: &mut [u8], dg: crate::sam::ReceivedDatagram) -> Result<(usize, I2pSocketAddr)> {
		let n = dg.payload.len().min(buf.len());
		buf[..n].copy_from_slice(&dg.payload[..n]);
		let addr = I2pSocketAddr::new(I2pAddr::from_b64(&dg.source_destination)?, dg.from_port);
		Ok((n, addr))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::net::BASE64_I2P;
	use crate::sam::ReceivedDatagram;

	#[test]
	fn deliver_copies_payload_and_resolves_sender_address() {
		let dest_bytes = vec![0x42u8; 387];
		let b64 = BASE64_I2P.encode(&dest_bytes);
		let dg = ReceivedDatagram {
			source_destination: b64.clone(),
			from_port: 42,
			to_port: 0,
			payload: b"hello".to_vec(),
		};

		let mut buf = [0u8; 16];
		let (n, addr) = I2pDatagramSocket::deliver(&mut buf, dg).unwrap();

		assert_eq!(&buf[..n], b"hello");
		assert_eq!(addr.port(), 42);
		assert_eq!(addr.dest(), I2pAddr::from_b64(&b64).unwrap());
	}

	#[test]
	fn deliver_truncates_payload_to_buffer_len() {
		let dg = ReceivedDatagram {
			source_destination: BASE64_I2P.encode(&[0x01u8; 387]),
			from_port: 1,
			to_port: 0,
			payload: b"0123456789".to_vec(),
		};
		let mut buf = [0u8; 4];
		let (n, _) = I2pDatagramSocket::deliver(&mut buf, dg).unwrap();
		assert_eq!(n, 4);
		assert_eq!(&buf, b"0123");
	}
}
