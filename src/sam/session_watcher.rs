//! provides a basic session watcher which wraps [I2pListener::accept] ensuring that
//! any errors which result in the session being terminated, such as clients improperly disconnecting
//! or other network/transport level issues are handled gracefully.
//!
//! any calls to accept which result in an error will cause the existing session and i2plistener to be dropped,
//! before they are recreated and an error is returned information the caller to try the operation again
//!

use anyhow::Result;

use super::sam_options::SAMOptions;
use super::{nickname, Session, SessionStyle, StreamConnect, StreamForward};
use crate::error::I2PError;
use crate::net::I2pSocketAddr;
use log::error;

/// SamSessionWatcher provides the ability to gracefully handle
/// runtime errors by restarting the sam session, and recreating the listener
/// any time errors are detected.
///
/// note: should implement better detection of which errors cause us
///       to recreate the connection
pub struct SamSessionWatcher {
	opts: SAMOptions,
	session: Session,
	destination: String,
	sam_endpoint: String,
	session_style: SessionStyle,
	forward: StreamForward,
}

impl SamSessionWatcher {
	pub fn new(
		sam_endpoint: &str,
		destination: &str,
		session_style: SessionStyle,
		opts: SAMOptions,
	) -> Result<Box<SamSessionWatcher>> {
		let (session, forward) = SamSessionWatcher::__recreate(
			sam_endpoint,
			destination,
			&nickname(),
			session_style,
			opts.clone(),
		)?;
		Ok(Box::new(SamSessionWatcher {
			opts,
			session,
			forward,
			session_style,
			destination: destination.to_string(),
			sam_endpoint: sam_endpoint.to_string(),
		}))
	}
	pub fn accept(self: &mut Box<Self>) -> Result<(StreamConnect, I2pSocketAddr)> {
		match self.forward.accept() {
			Ok(res) => Ok(res),
			Err(err) => {
				error!("accept encountered error, recreating stream: {:#?}", err);
				if let Err(quit_err) = self.session.quit() {
					error!(
						"failed to cleanly close session during recreate: {:#?}",
						quit_err
					);
				}
				self.recreate()?;
				Err(I2PError::SessionRecreated.into())
			}
		}
	}
	fn recreate(self: &mut Box<Self>) -> Result<()> {
		let (session, forward) = SamSessionWatcher::__recreate(
			&self.sam_endpoint,
			&self.destination,
			&nickname(),
			self.session_style,
			self.opts.clone(),
		)?;
		self.session = session;
		self.forward = forward;
		Ok(())
	}
	fn __recreate(
		sam_endpoint: &str,
		destination: &str,
		nickname: &str,
		session_style: SessionStyle,
		opts: SAMOptions,
	) -> Result<(Session, StreamForward)> {
		// `Session::create` registers its own control socket with the
		// process-wide shutdown coordinator (§9); nothing extra to do here.
		let session = Session::create(sam_endpoint, destination, nickname, session_style, opts)?;
		let forward = StreamForward::with_session(&session)?;
		Ok((session, forward))
	}
}
