//! Binary router-control client (§4.I): wire framing, the session
//! handshake, LeaseSet2 construction, host lookup, and the async client task
//! that ties them together with the streaming engine (component G) and
//! datagram codec (component E). New module tree -- the teacher only ever
//! speaks SAMv3 (component H); I2CP is the router-control alternative
//! spec.md §2 and §4.I describe in full.

pub mod client;
pub mod leaseset;
pub mod lookup;
pub mod session;
pub mod wire;

pub use client::{connect, I2cpHandle, IncomingDatagram, IncomingStream};
