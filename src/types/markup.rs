use std::collections::BTreeMap;

use super::message::Message;
use super::segment::{is_valid_tag, unescape, Segment};
use crate::error::{CqError, Result};

const CODE_PREFIX: &str = "[CQ:";

/// Parses CQ markup back into a message.
///
/// Text between codes becomes a single text segment and empty text is dropped.
/// Brackets that do not open a `[CQ:` code are kept as text.
pub fn parse_markup(markup: &str) -> Result<Message> {
    let mut message = Message::new();
    let mut rest = markup;
    let mut offset = 0;

    while let Some(start) = rest.find(CODE_PREFIX) {
        push_text(&mut message, &rest[..start]);

        let position = offset + start;
        let body_start = start + CODE_PREFIX.len();
        let end = rest[body_start..]
            .find(']')
            .ok_or(CqError::MalformedMarkup {
                position,
                reason: "unterminated code",
            })?;
        message.push(parse_code(&rest[body_start..body_start + end], position)?);

        let consumed = body_start + end + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }
    push_text(&mut message, rest);
    Ok(message)
}

fn push_text(message: &mut Message, text: &str) {
    if !text.is_empty() {
        message.push(Segment::text(unescape(text)));
    }
}

fn parse_code(body: &str, position: usize) -> Result<Segment> {
    let mut parts = body.split(',');
    let tag = parts.next().unwrap_or_default();
    if !is_valid_tag(tag) {
        return Err(CqError::MalformedMarkup {
            position,
            reason: "invalid segment type",
        });
    }

    let mut data = BTreeMap::new();
    for part in parts {
        let (key, value) = part.split_once('=').ok_or(CqError::MalformedMarkup {
            position,
            reason: "parameter without `=`",
        })?;
        if data.insert(key.to_string(), unescape(value)).is_some() {
            return Err(CqError::MalformedMarkup {
                position,
                reason: "duplicate parameter",
            });
        }
    }

    Segment::from_parts(tag.to_string(), data)
        .map_err(|reason| CqError::MalformedMarkup { position, reason })
}
