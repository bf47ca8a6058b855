//! CQ code messages for OneBot v11 style chat APIs.
//!
//! [`Segment`] and [`Message`] model the content, render it as CQ markup and
//! serialize it as the segment array the API expects. Actions and the
//! [`OneBotConnection`](connection::OneBotConnection) trait describe what gets
//! sent; the transport itself is left to the caller.
pub mod config;
pub mod connection;
pub mod error;
pub mod payload;

/// Types used in the OneBot protocol.
pub mod types;

pub use error::{CqError, Result};
pub use types::{Message, Segment, SegmentKind};
