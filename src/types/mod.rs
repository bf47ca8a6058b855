/// Onebot Action types
pub mod action;
/// Onebot Event types
pub mod event;
pub mod markup;
pub mod message;
pub mod segment;

pub use event::*;
pub use markup::parse_markup;
pub use message::Message;
pub use segment::{escape, unescape, Segment, SegmentKind};
pub use serde_json::Value;
