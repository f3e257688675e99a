//! An I2P client library: destination codec and signing (§3), the
//! session-bridge (SAMv3, §4.H) and router-control (I2CP, §4.I) protocol
//! clients, a reliable streaming engine (§4.F/G), and a datagram envelope
//! codec (§4.E).

pub mod bytes;
pub mod crypto;
pub mod datagram;
pub mod destination;
pub mod error;
pub mod i2cp;
pub mod net;
pub mod sam;
pub mod shutdown;
pub mod streaming;
mod utils;

pub use destination::{Destination, LocalDestination};
pub use error::I2PError;
pub use sam::{Session, SessionManager, SessionStyle};
