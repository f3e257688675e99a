pub mod engine;
pub mod packet;

pub use engine::{Stream, StreamEvent};
pub use packet::Packet;
