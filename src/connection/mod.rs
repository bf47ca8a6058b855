mod obc;

pub use obc::{MessageSender, OneBotConnection};
