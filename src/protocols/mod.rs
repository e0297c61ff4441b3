//! Protocol implementations.
//!
//! Each protocol module turns typed packets into wire bytes that the
//! server writes through a pooled context.
//!
//! ## Protocols
//! - `mqtt`: MQTT 3.1.1 control packets

pub mod mqtt;
