use crate::error::FetchError;
use crate::query::encode_component;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

const SITE_DEFINE_URL: &str = "https://www.urbandictionary.com/define.php?term=";
const WRITTEN_ON_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// One definition as published on the site.
///
/// Equality and hashing only look at [`Word::id`], so two fetches of the same
/// definition compare equal even when vote counts moved in between.
#[derive(Debug, Clone, Serialize)]
pub struct Word {
    pub id: u64,
    pub term: String,
    pub definition: String,
    pub example: String,
    pub author: String,
    pub written_on: DateTime<Utc>,
    pub permalink: String,
    pub thumbs_up: u64,
    pub thumbs_down: u64,
    pub current_vote: String,
    /// Day a definition was featured, only set for words of the day.
    pub featured_on: Option<String>,
}

impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Word {}

impl Hash for Word {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A batch of words returned by one request, in site ranking order.
#[derive(Debug, Clone)]
pub struct Page {
    index: usize,
    words: Arc<[Word]>,
}

impl Page {
    pub fn new(index: usize, words: Vec<Word>) -> Self {
        Self {
            index,
            words: words.into(),
        }
    }

    pub fn empty(index: usize) -> Self {
        Self::new(index, Vec::new())
    }

    /// Zero-based position of this page in its query's result set.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }
}

impl Deref for Page {
    type Target = [Word];

    fn deref(&self) -> &[Word] {
        &self.words
    }
}

/// How bracketed cross-references in definitions are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextFormat {
    /// `[term]` becomes `term`.
    #[default]
    Plain,
    /// `[term]` becomes a markdown link to the term's page on the site.
    Markdown,
}

#[derive(Deserialize)]
struct DefinitionList {
    list: Option<Vec<RawDefinition>>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct RawDefinition {
    defid: u64,
    word: String,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    example: String,
    #[serde(default)]
    author: String,
    written_on: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    thumbs_up: u64,
    #[serde(default)]
    thumbs_down: u64,
    #[serde(default)]
    current_vote: String,
    date: Option<String>,
}

impl RawDefinition {
    fn into_word(self, format: TextFormat) -> Result<Word, FetchError> {
        let written_on = parse_written_on(&self.written_on)?;
        Ok(Word {
            id: self.defid,
            term: self.word,
            definition: format_links(&self.definition, format),
            example: format_links(&self.example, format),
            author: self.author,
            written_on,
            permalink: self.permalink,
            thumbs_up: self.thumbs_up,
            thumbs_down: self.thumbs_down,
            current_vote: self.current_vote,
            featured_on: self.date,
        })
    }
}

/// Parses a definition list body into words.
///
/// A body carrying `error`, or lacking `list`, is rejected even when the rest
/// of the document is well formed.
pub fn parse_definitions(body: &str, format: TextFormat) -> Result<Vec<Word>, FetchError> {
    let response: DefinitionList = serde_json::from_str(body)?;
    if let Some(message) = response.error.filter(|message| !message.is_empty()) {
        return Err(FetchError::Service(message));
    }
    let Some(list) = response.list else {
        return Err(FetchError::Service("Invalid response".to_string()));
    };
    list.into_iter()
        .map(|definition| definition.into_word(format))
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestionBody {
    Terms(Vec<String>),
    Failure { error: String },
}

/// Parses the autocomplete endpoint's body: a bare JSON array of strings.
pub fn parse_suggestions(body: &str) -> Result<Vec<String>, FetchError> {
    match serde_json::from_str(body)? {
        SuggestionBody::Terms(terms) => Ok(terms),
        SuggestionBody::Failure { error } => Err(FetchError::Service(error)),
    }
}

fn parse_written_on(value: &str) -> Result<DateTime<Utc>, FetchError> {
    NaiveDateTime::parse_from_str(value, WRITTEN_ON_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| FetchError::Timestamp {
            value: value.to_string(),
            source,
        })
}

/// Rewrites every `[term]` on a single line according to `format`.
pub fn format_links(text: &str, format: TextFormat) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find(|ch| ch == ']' || ch == '\n')
            .filter(|&idx| after[idx..].starts_with(']'));
        match close {
            Some(close) => {
                let term = &after[..close];
                match format {
                    TextFormat::Plain => out.push_str(term),
                    TextFormat::Markdown => {
                        out.push('[');
                        out.push_str(term);
                        out.push_str("](");
                        out.push_str(SITE_DEFINE_URL);
                        out.push_str(&encode_component(term));
                        out.push(')');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push('[');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
pub(crate) fn sample_word(id: u64, term: &str) -> Word {
    use chrono::TimeZone;
    Word {
        id,
        term: term.to_string(),
        definition: format!("definition #{id} of {term}"),
        example: format!("example #{id}"),
        author: "tester".to_string(),
        written_on: Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap(),
        permalink: format!("http://{term}.urbanup.com/{id}"),
        thumbs_up: id,
        thumbs_down: 0,
        current_vote: String::new(),
        featured_on: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const HELLO_BODY: &str = r#"{
        "list": [
            {
                "definition": "A [greeting].",
                "permalink": "http://hello.urbanup.com/1",
                "thumbs_up": 120,
                "author": "someone",
                "word": "hello",
                "defid": 1,
                "current_vote": "",
                "written_on": "2003-05-12T00:00:00.000Z",
                "example": "[Hello], [how are you]?",
                "thumbs_down": 30,
                "sound_urls": []
            },
            {
                "definition": "Second take",
                "permalink": "http://hello.urbanup.com/2",
                "thumbs_up": 5,
                "author": "other",
                "word": "hello",
                "defid": 2,
                "current_vote": "up",
                "written_on": "2019-11-02T17:45:09.123456Z",
                "example": "",
                "thumbs_down": 1
            }
        ]
    }"#;

    #[test]
    fn parses_definition_list_in_order() {
        let words = parse_definitions(HELLO_BODY, TextFormat::Plain).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].id, 1);
        assert_eq!(words[0].term, "hello");
        assert_eq!(words[0].definition, "A greeting.");
        assert_eq!(words[0].example, "Hello, how are you?");
        assert_eq!(words[0].thumbs_up, 120);
        assert_eq!(words[0].thumbs_down, 30);
        assert_eq!(words[1].current_vote, "up");
        assert_eq!(words[1].written_on.year(), 2019);
        assert_eq!(words[1].written_on.second(), 9);
        assert_eq!(words[1].written_on.nanosecond(), 123_456_000);
    }

    #[test]
    fn markdown_format_links_terms_to_the_site() {
        let words = parse_definitions(HELLO_BODY, TextFormat::Markdown).unwrap();
        assert_eq!(
            words[0].example,
            "[Hello](https://www.urbandictionary.com/define.php?term=Hello), \
             [how are you](https://www.urbandictionary.com/define.php?term=how%20are%20you)?"
        );
    }

    #[test]
    fn error_field_is_a_service_error() {
        let err = parse_definitions(r#"{"error": "rate limited"}"#, TextFormat::Plain)
            .unwrap_err();
        assert!(matches!(err, FetchError::Service(message) if message == "rate limited"));
    }

    #[test]
    fn missing_list_is_rejected() {
        let err = parse_definitions("{}", TextFormat::Plain).unwrap_err();
        assert!(matches!(err, FetchError::Service(_)));
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = parse_definitions("<html>", TextFormat::Plain).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn bad_timestamp_names_the_value() {
        let body = r#"{"list": [{"defid": 9, "word": "x", "written_on": "yesterday"}]}"#;
        match parse_definitions(body, TextFormat::Plain).unwrap_err() {
            FetchError::Timestamp { value, .. } => assert_eq!(value, "yesterday"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_list_is_an_empty_page() {
        let words = parse_definitions(r#"{"list": []}"#, TextFormat::Plain).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn featured_date_is_kept() {
        let body = r#"{"list": [{"defid": 3, "word": "wotd", "written_on": "2020-01-01T00:00:00.000Z", "date": "January 2"}]}"#;
        let words = parse_definitions(body, TextFormat::Plain).unwrap();
        assert_eq!(words[0].featured_on.as_deref(), Some("January 2"));
    }

    #[test]
    fn brackets_do_not_span_lines() {
        assert_eq!(format_links("a [b\nc] [d]", TextFormat::Plain), "a [b\nc] d");
        assert_eq!(format_links("open [ only", TextFormat::Plain), "open [ only");
        assert_eq!(format_links("[[x]]", TextFormat::Plain), "[x]");
    }

    #[test]
    fn words_compare_by_id() {
        let a = sample_word(7, "alpha");
        let mut b = sample_word(7, "alpha");
        b.thumbs_up = 9000;
        assert_eq!(a, b);
        assert_ne!(a, sample_word(8, "alpha"));
    }

    #[test]
    fn suggestions_parse_from_array() {
        let terms = parse_suggestions(r#"["hello", "hello kitty"]"#).unwrap();
        assert_eq!(terms, vec!["hello".to_string(), "hello kitty".to_string()]);
        let err = parse_suggestions(r#"{"error": "nope"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Service(message) if message == "nope"));
    }

    #[test]
    fn page_derefs_to_words() {
        let page = Page::new(2, vec![sample_word(1, "a"), sample_word(2, "a")]);
        assert_eq!(page.index(), 2);
        assert_eq!(page.len(), 2);
        assert_eq!(page.first().map(|word| word.id), Some(1));
        assert!(Page::empty(0).is_empty());
    }
}
