//! Inbound live messages: parsing, routing and the built-in handlers.

mod dispatch;
mod handlers;

pub use dispatch::{DispatchOutcome, InboundHandler, InboundMessage, LiveSession, MessageDispatcher};
pub use handlers::{ChatMessageHandler, CodeEditorHandler, ReactionHandler, VideoSignalHandler};

use std::sync::Arc;

use crate::ports::RoomEventSink;

use super::change_tracking::UnitOfWorkFactory;

/// Dispatcher with every built-in handler registered.
pub fn room_message_dispatcher(
    sink: Arc<dyn RoomEventSink>,
    units: UnitOfWorkFactory,
) -> MessageDispatcher {
    MessageDispatcher::new()
        .with_handler(ChatMessageHandler::new(sink.clone()))
        .with_handler(ReactionHandler::new(sink.clone()))
        .with_handler(CodeEditorHandler::new(units))
        .with_handler(VideoSignalHandler::new(sink))
}
