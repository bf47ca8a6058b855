use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{CqError, Result};

pub const TEXT_TYPE: &str = "text";
pub const TEXT_PARAM: &str = "text";
pub const AT_TYPE: &str = "at";
pub const IMAGE_TYPE: &str = "image";
pub const RECORD_TYPE: &str = "record";
pub const MUSIC_TYPE: &str = "music";
pub const SHAKE_TYPE: &str = "shake";

/// The kinds of segment this crate knows about.
///
/// Anything else still decodes, it just reports [`SegmentKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Text,
    At,
    Image,
    Record,
    Music,
    Shake,
    Rps,
    Dice,
    Share,
    Other,
}

impl SegmentKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            TEXT_TYPE => SegmentKind::Text,
            AT_TYPE => SegmentKind::At,
            IMAGE_TYPE => SegmentKind::Image,
            RECORD_TYPE => SegmentKind::Record,
            MUSIC_TYPE => SegmentKind::Music,
            SHAKE_TYPE => SegmentKind::Shake,
            "rps" => SegmentKind::Rps,
            "dice" => SegmentKind::Dice,
            "share" => SegmentKind::Share,
            _ => SegmentKind::Other,
        }
    }

    /// Standalone segments must be sent as a message of their own and can not
    /// be joined with any other content.
    pub fn is_standalone(self) -> bool {
        matches!(
            self,
            SegmentKind::Record
                | SegmentKind::Rps
                | SegmentKind::Dice
                | SegmentKind::Music
                | SegmentKind::Share
        )
    }
}

/// One unit of message content: a type tag plus named string parameters.
///
/// Parameters are kept sorted by key, so the raw rendering is deterministic
/// and equality/hashing ignore the order parameters were supplied in.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(try_from = "SegmentRecord")]
pub struct Segment {
    #[serde(rename = "type")]
    tag: String,
    data: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct SegmentRecord {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    data: Option<BTreeMap<String, String>>,
}

impl TryFrom<SegmentRecord> for Segment {
    type Error = serde_json::Error;

    fn try_from(record: SegmentRecord) -> Result<Self, Self::Error> {
        Segment::from_parts(record.tag, record.data.unwrap_or_default())
            .map_err(serde_json::Error::custom)
    }
}

impl Segment {
    fn new<'a>(tag: &str, params: impl IntoIterator<Item = (&'a str, String)>) -> Self {
        Self {
            tag: tag.to_string(),
            data: params
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        }
    }

    /// Builds a segment from decoded parts, checking the tag and the text invariant.
    pub(crate) fn from_parts(
        tag: String,
        data: BTreeMap<String, String>,
    ) -> Result<Self, &'static str> {
        if !is_valid_tag(&tag) {
            return Err("invalid segment type, expected one or more of [A-Za-z0-9._-]");
        }
        if !data.keys().all(|key| is_valid_tag(key)) {
            return Err("invalid parameter name, expected one or more of [A-Za-z0-9._-]");
        }
        if tag == TEXT_TYPE && (data.len() != 1 || !data.contains_key(TEXT_PARAM)) {
            return Err("text segment must carry exactly the `text` parameter");
        }
        Ok(Self { tag, data })
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(TEXT_TYPE, [(TEXT_PARAM, content.into())])
    }

    pub fn at(user_id: i64) -> Self {
        Self::new(AT_TYPE, [("qq", user_id.to_string())])
    }

    pub fn at_all() -> Self {
        Self::new(AT_TYPE, [("qq", "all".to_string())])
    }

    pub fn local_image(path: &str) -> Self {
        Self::new(IMAGE_TYPE, [("file", format!("file://{path}"))])
    }

    /// An image fetched from `url`. With `no_cache` the service downloads it again
    /// instead of reusing its cached copy.
    pub fn remote_image(url: impl Into<String>, no_cache: bool) -> Self {
        Self::with_cache_flag(IMAGE_TYPE, url.into(), no_cache)
    }

    pub fn remote_audio(url: impl Into<String>, no_cache: bool) -> Self {
        Self::with_cache_flag(RECORD_TYPE, url.into(), no_cache)
    }

    fn with_cache_flag(tag: &str, url: String, no_cache: bool) -> Self {
        let mut segment = Self::new(tag, [("file", url)]);
        if no_cache {
            segment.data.insert("cache".to_string(), "0".to_string());
        }
        segment
    }

    /// A custom music share card.
    ///
    /// `introduction_url` is the page opened when the card is clicked and
    /// `audio_url` the playable file. `profile` is kept whenever it is given,
    /// `image_url` only when it is non-empty; without it the default cover is shown.
    ///
    /// # Errors
    ///
    /// [`CqError::InvalidArgument`] if `introduction_url`, `audio_url` or `title`
    /// is empty or only whitespace.
    pub fn custom_music_share(
        introduction_url: &str,
        audio_url: &str,
        title: &str,
        profile: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Self> {
        check_argument(introduction_url, "introduction_url")?;
        check_argument(audio_url, "audio_url")?;
        check_argument(title, "title")?;

        let mut segment = Self::new(
            MUSIC_TYPE,
            [
                ("url", introduction_url.to_string()),
                ("audio", audio_url.to_string()),
                ("title", title.to_string()),
            ],
        );
        if let Some(profile) = profile {
            segment.data.insert("content".to_string(), profile.to_string());
        }
        if let Some(image_url) = image_url.filter(|url| !url.is_empty()) {
            segment.data.insert("image".to_string(), image_url.to_string());
        }
        Ok(segment)
    }

    pub fn shake() -> Self {
        Self::new(SHAKE_TYPE, std::iter::empty::<(&str, String)>())
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> SegmentKind {
        SegmentKind::from_tag(&self.tag)
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// The literal content of a text segment.
    pub fn as_text(&self) -> Option<&str> {
        if self.tag == TEXT_TYPE {
            self.param(TEXT_PARAM)
        } else {
            None
        }
    }

    /// Renders the segment as CQ markup.
    ///
    /// Text renders as its escaped content with no brackets, everything else as
    /// `[CQ:tag,key=value,...]` with keys in sorted order.
    pub fn raw(&self) -> String {
        if let Some(text) = self.as_text() {
            return escape(text, false);
        }
        let mut raw = format!("[CQ:{}", self.tag);
        for (key, value) in &self.data {
            raw.push(',');
            raw.push_str(key);
            raw.push('=');
            raw.push_str(&escape(value, true));
        }
        raw.push(']');
        raw
    }

    /// The structured `{"type": ..., "data": {...}}` record sent to the API.
    pub fn to_record(&self) -> Value {
        json!({
            "type": self.tag,
            "data": self.data,
        })
    }

    /// Decodes a structured record back into a segment.
    ///
    /// A missing or `null` `data` decodes as no parameters.
    pub fn from_record(record: &Value) -> Result<Self> {
        Segment::deserialize(record).map_err(|e| CqError::malformed(record, e))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(text),
            None => f.write_str(&self.raw()),
        }
    }
}

pub(crate) fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn check_argument(value: &str, name: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CqError::InvalidArgument {
            name,
            reason: "must not be empty or whitespace",
        });
    }
    Ok(())
}

/// Entity-escapes markup delimiters.
///
/// `&`, `[` and `]` are always escaped; `,` only when `in_param` is set, since
/// only parameter values sit inside a comma separated list.
pub fn escape(text: &str, in_param: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '[' => escaped.push_str("&#91;"),
            ']' => escaped.push_str("&#93;"),
            ',' if in_param => escaped.push_str("&#44;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Reverses [`escape`]. `&amp;` goes last so escaped entities stay literal.
pub fn unescape(text: &str) -> String {
    text.replace("&#44;", ",")
        .replace("&#91;", "[")
        .replace("&#93;", "]")
        .replace("&amp;", "&")
}
