//! Live delivery to room participants over WebSocket.
//!
//! - `InMemoryConnectionRegistry` - live connections per room
//! - `TransportSender` / `CachedEventProvider` - serialize-once fan-out
//! - `live_router` - the axum upgrade endpoint

mod handler;
mod messages;
mod registry;
mod sender;

pub use handler::{live_router, LiveQuery, LiveState, WsConnection, DEFAULT_OUTBOUND_BUFFER};
pub use messages::{ErrorFrame, OutboundEvent};
pub use registry::{filters, InMemoryConnectionRegistry};
pub use sender::{CachedEventProvider, TransportSender};
