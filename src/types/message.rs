use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::markup::parse_markup;
use super::segment::Segment;
use crate::error::{CqError, Result};

/// An ordered sequence of segments forming one chat message.
///
/// Serializes as the segment array the API expects. Deserializes from either
/// that array or a raw CQ markup string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Message {
    segments: Vec<Segment>,
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Message::from_value(&value).map_err(D::Error::custom)
    }
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Segment::text(text).into()
    }

    pub fn at(user_id: i64) -> Self {
        Segment::at(user_id).into()
    }

    pub fn at_all() -> Self {
        Segment::at_all().into()
    }

    pub fn local_image(path: &str) -> Self {
        Segment::local_image(path).into()
    }

    pub fn remote_image(url: impl Into<String>, no_cache: bool) -> Self {
        Segment::remote_image(url, no_cache).into()
    }

    pub fn remote_audio(url: impl Into<String>, no_cache: bool) -> Self {
        Segment::remote_audio(url, no_cache).into()
    }

    /// A music share with only the link, audio and title.
    pub fn custom_music_share(
        introduction_url: &str,
        audio_url: &str,
        title: &str,
    ) -> Result<Self> {
        Segment::custom_music_share(introduction_url, audio_url, title, None, None).map(Self::from)
    }

    /// A music share with a profile line and a cover image.
    pub fn custom_music_share_with(
        introduction_url: &str,
        audio_url: &str,
        title: &str,
        profile: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Self> {
        Segment::custom_music_share(introduction_url, audio_url, title, profile, image_url)
            .map(Self::from)
    }

    pub fn shake() -> Self {
        Segment::shake().into()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// False when any segment is standalone-only (audio, dice, music share, ...).
    pub fn composable(&self) -> bool {
        !self.segments.iter().any(|s| s.kind().is_standalone())
    }

    /// Joins two messages into a new one, `self` first.
    ///
    /// Neither operand is modified.
    ///
    /// # Errors
    ///
    /// [`CqError::NotComposable`] if either message holds a standalone segment.
    pub fn combine(&self, other: &Message) -> Result<Message> {
        if !self.composable() || !other.composable() {
            log::debug!("refusing to combine messages: {} + {}", self.raw(), other.raw());
            return Err(CqError::NotComposable);
        }
        let mut segments = Vec::with_capacity(self.len() + other.len());
        segments.extend_from_slice(&self.segments);
        segments.extend_from_slice(&other.segments);
        Ok(Message { segments })
    }

    /// The whole message as CQ markup.
    pub fn raw(&self) -> String {
        self.segments.iter().map(Segment::raw).collect()
    }

    /// One `{"type", "data"}` record per segment, in order.
    pub fn to_records(&self) -> Vec<Value> {
        self.segments.iter().map(Segment::to_record).collect()
    }

    /// Decodes either wire form: a segment record array or a markup string.
    ///
    /// A bad record fails with [`CqError::MalformedSegment`] carrying the
    /// underlying parse error.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(records) => Message::from_records(records),
            Value::String(markup) => parse_markup(markup),
            other => Err(CqError::SerdeError(serde_json::Error::custom(format!(
                "expected segment array or markup string, got {other}"
            )))),
        }
    }

    /// Decodes a list of segment records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Value>) -> Result<Self> {
        let segments = records
            .into_iter()
            .map(Segment::from_record)
            .collect::<Result<Vec<_>>>()?;
        Ok(Message { segments })
    }
}

impl From<Segment> for Message {
    fn from(segment: Segment) -> Self {
        Message {
            segments: vec![segment],
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::from_text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::from_text(text)
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn music() -> Message {
        Message::custom_music_share("http://a", "http://a/a.mp3", "T").unwrap()
    }

    #[test]
    fn combine_keeps_order() {
        let text = Message::from_text("hi ");
        let at = Message::at(12345);
        let combined = text.combine(&at).unwrap();
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.segments()[0], Segment::text("hi "));
        assert_eq!(combined.segments()[1], Segment::at(12345));
        assert_eq!(combined.raw(), "hi [CQ:at,qq=12345]");

        // operands are untouched
        assert_eq!(text.len(), 1);
        assert_eq!(at.len(), 1);
    }

    #[test]
    fn combine_keeps_duplicates() {
        let at = Message::at(1);
        let twice = at.combine(&at).unwrap();
        assert_eq!(twice.segments(), &[Segment::at(1), Segment::at(1)]);
    }

    #[test]
    fn music_is_not_composable() {
        let text = Message::from_text("listen");
        assert!(!music().composable());
        assert!(matches!(music().combine(&text), Err(CqError::NotComposable)));
        assert!(matches!(text.combine(&music()), Err(CqError::NotComposable)));
        assert!(matches!(music().combine(&Message::new()), Err(CqError::NotComposable)));
    }

    #[test]
    fn audio_is_not_composable() {
        let audio = Message::remote_audio("http://x/y.amr", false);
        assert!(!audio.composable());
        assert!(Message::shake().composable());
        assert!(matches!(Message::at_all().combine(&audio), Err(CqError::NotComposable)));
    }

    #[test]
    fn music_share_rejects_empty_url() {
        let err = Message::custom_music_share("", "http://a/a.mp3", "T").unwrap_err();
        assert!(matches!(err, CqError::InvalidArgument { .. }));
    }

    #[test]
    fn serializes_as_records() {
        let message = Message::from_text("look: ")
            .combine(&Message::remote_image("http://x/y.png", true))
            .unwrap()
            .combine(&Message::at(7))
            .unwrap();
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!([
                {"type": "text", "data": {"text": "look: "}},
                {"type": "image", "data": {"cache": "0", "file": "http://x/y.png"}},
                {"type": "at", "data": {"qq": "7"}},
            ])
        );
        assert_eq!(Value::Array(message.to_records()), value);
    }

    #[test]
    fn decodes_records_and_markup() {
        let message = Message::from_text("a").combine(&Message::shake()).unwrap();

        let records = serde_json::to_value(&message).unwrap();
        let from_array: Message = serde_json::from_value(records).unwrap();
        assert_eq!(from_array, message);

        let from_markup: Message = serde_json::from_value(json!("a[CQ:shake]")).unwrap();
        assert_eq!(from_markup, message);

        assert_eq!(Message::from_records(&message.to_records()).unwrap(), message);
    }

    #[test]
    fn decode_errors_keep_the_segment_failure() {
        let err = serde_json::from_value::<Message>(json!([
            {"type": "text", "data": {"text": "ok"}},
            {"type": "at", "data": {"qq": 1}}
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("invalid type: integer"), "{err}");

        let empty_text = json!([{"type": "text", "data": {}}]);
        let err = serde_json::from_value::<Message>(empty_text).unwrap_err();
        assert!(err.to_string().contains("exactly the `text` parameter"), "{err}");

        let err = serde_json::from_value::<Message>(json!(1)).unwrap_err();
        assert!(err.to_string().contains("expected segment array or markup string"), "{err}");

        match Message::from_value(&json!([{"type": "at", "data": {"qq": 1}}])) {
            Err(CqError::MalformedSegment { record, source }) => {
                assert_eq!(record, json!({"type": "at", "data": {"qq": 1}}).to_string());
                assert!(source.to_string().contains("invalid type: integer"));
            }
            other => panic!("expected malformed segment, got {other:?}"),
        }
    }

    #[test]
    fn types_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Segment>();
        assert_send_sync::<Message>();
    }

    #[test]
    fn from_records_reports_bad_record() {
        let records = vec![json!({"type": "text", "data": {"text": "a"}}), json!({"data": {}})];
        assert!(matches!(Message::from_records(&records), Err(CqError::MalformedSegment { .. })));
    }

    #[test]
    fn equality_is_ordered() {
        let ab = Message::from_text("a").combine(&Message::at(1)).unwrap();
        let ba = Message::at(1).combine(&Message::from_text("a")).unwrap();
        assert_ne!(ab, ba);
        assert_eq!(ab, Message::from_text("a").combine(&Message::at(1)).unwrap());
    }
}
