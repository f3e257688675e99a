//! Process-wide shutdown coordinator (§9). Every client that owns a
//! control socket (a session-bridge [`crate::sam::Session`], a subsession,
//! or an accept loop's duplicated handle) registers it here. On shutdown
//! every registered socket is sent `QUIT` and dropped; this never touches
//! stream or session state machines, which [`crate::sam::session_watcher`]
//! already knows how to recreate if a single accept loop dies mid-flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use lazy_static::lazy_static;
use log::warn;

/// Anything that can be asked to cleanly close its control socket.
pub trait ShutdownCapable: Send {
	fn quit(&mut self) -> Result<()>;
}

impl ShutdownCapable for crate::sam::Session {
	fn quit(&mut self) -> Result<()> {
		crate::sam::Session::quit(self)
	}
}

impl ShutdownCapable for crate::i2cp::I2cpHandle {
	fn quit(&mut self) -> Result<()> {
		crate::i2cp::I2cpHandle::shutdown(self).map_err(Into::into)
	}
}

lazy_static! {
	static ref REGISTRY: Mutex<Vec<(u64, Box<dyn ShutdownCapable>)>> = Mutex::new(Vec::new());
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Handle returned by [`register`]. Dropping it does nothing; pass it to
/// [`unregister`] if the caller is closing the socket itself and doesn't
/// want it sent a second, redundant `QUIT` at process shutdown.
#[derive(Debug)]
pub struct Registration(u64);

/// Registers a control socket with the process-wide shutdown sweep.
pub fn register<T: ShutdownCapable + 'static>(handle: T) -> Registration {
	let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
	REGISTRY.lock().unwrap().push((id, Box::new(handle)));
	Registration(id)
}

pub fn unregister(registration: Registration) {
	REGISTRY.lock().unwrap().retain(|(id, _)| *id != registration.0);
}

/// How many control sockets are currently registered.
pub fn registered_count() -> usize {
	REGISTRY.lock().unwrap().len()
}

/// Sends `QUIT` to every registered control socket. Write-and-forget: a
/// failure on one socket is logged but doesn't stop the sweep over the
/// rest.
pub fn shutdown_all() {
	let mut registry = REGISTRY.lock().unwrap();
	for (_, handle) in registry.iter_mut() {
		if let Err(err) = handle.quit() {
			warn!("failed to send QUIT during shutdown: {}", err);
		}
	}
	registry.clear();
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::AtomicBool;
	use std::sync::Arc;

	struct FakeSocket {
		quit_sent: Arc<AtomicBool>,
		fail: bool,
	}

	impl ShutdownCapable for FakeSocket {
		fn quit(&mut self) -> Result<()> {
			if self.fail {
				return Err(I2PErrorStub.into());
			}
			self.quit_sent.store(true, Ordering::SeqCst);
			Ok(())
		}
	}

	#[derive(Debug, thiserror::Error)]
	#[error("stub failure")]
	struct I2PErrorStub;

	// Tests share the process-global registry, so each clears it first to
	// stay independent of ordering/parallelism.
	fn clear_registry() {
		REGISTRY.lock().unwrap().clear();
	}

	#[test]
	fn shutdown_all_sends_quit_to_every_registration() {
		clear_registry();
		let sent_a = Arc::new(AtomicBool::new(false));
		let sent_b = Arc::new(AtomicBool::new(false));
		register(FakeSocket { quit_sent: sent_a.clone(), fail: false });
		register(FakeSocket { quit_sent: sent_b.clone(), fail: false });
		assert_eq!(registered_count(), 2);

		shutdown_all();

		assert!(sent_a.load(Ordering::SeqCst));
		assert!(sent_b.load(Ordering::SeqCst));
		assert_eq!(registered_count(), 0);
	}

	#[test]
	fn shutdown_all_continues_past_a_failing_socket() {
		clear_registry();
		let sent = Arc::new(AtomicBool::new(false));
		register(FakeSocket { quit_sent: Arc::new(AtomicBool::new(false)), fail: true });
		register(FakeSocket { quit_sent: sent.clone(), fail: false });

		shutdown_all();

		assert!(sent.load(Ordering::SeqCst));
		assert_eq!(registered_count(), 0);
	}

	#[test]
	fn unregister_removes_a_single_handle() {
		clear_registry();
		let sent = Arc::new(AtomicBool::new(false));
		let reg = register(FakeSocket { quit_sent: sent.clone(), fail: false });
		assert_eq!(registered_count(), 1);
		unregister(reg);
		assert_eq!(registered_count(), 0);

		shutdown_all();
		assert!(!sent.load(Ordering::SeqCst));
	}

	/// Drives a real `Session::create` against a fake SAM server and confirms
	/// the resulting session registers itself here, and that an explicit
	/// `quit()` unregisters it rather than leaving a stale duplicate behind
	/// for `shutdown_all` to (redundantly) close later.
	#[test]
	fn creating_a_session_through_the_public_api_registers_it() {
		use crate::sam::{SessionStyle, Options};
		use std::io::{BufRead, BufReader, Write};
		use std::net::TcpListener;
		use std::thread;

		clear_registry();

		let listener = TcpListener::bind("127.0.0.1:0").unwrap();
		let addr = listener.local_addr().unwrap();

		let server = thread::spawn(move || {
			let (stream, _) = listener.accept().unwrap();
			let mut reader = BufReader::new(stream.try_clone().unwrap());
			let mut writer = stream;

			let mut line = String::new();
			reader.read_line(&mut line).unwrap(); // HELLO VERSION
			writer.write_all(b"HELLO REPLY RESULT=OK VERSION=3.3\n").unwrap();

			line.clear();
			reader.read_line(&mut line).unwrap(); // SESSION CREATE
			writer
				.write_all(b"SESSION STATUS RESULT=OK DESTINATION=dummy\n")
				.unwrap();

			line.clear();
			reader.read_line(&mut line).unwrap(); // NAMING LOOKUP NAME=ME
			writer
				.write_all(b"NAMING REPLY RESULT=OK NAME=ME VALUE=dummydest\n")
				.unwrap();

			line.clear();
			reader.read_line(&mut line).unwrap(); // QUIT
			writer.write_all(b"QUIT STATUS RESULT=OK\n").unwrap();
		});

		let mut session =
			crate::sam::Session::create(addr, "TRANSIENT", "shutdown-test", SessionStyle::Stream, Options::default())
				.unwrap();
		assert_eq!(registered_count(), 1);

		// `Session::quit` unregisters before sending QUIT, so a caller that
		// closes its own session doesn't leave a dangling duplicate.
		let _ = session.quit();
		assert_eq!(registered_count(), 0);

		server.join().unwrap();
	}
}
