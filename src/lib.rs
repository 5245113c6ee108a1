//! Interview Room - live event pipeline for interview sessions
//!
//! Room entities change through units of work; a change-interception
//! pipeline derives room events from those changes, a per-room bus orders
//! them, and a dispatcher fans them out to WebSocket participants while
//! staging them in hot storage. A background drain moves staged events to
//! durable storage.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
