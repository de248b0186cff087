use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt;

pub const DEFAULT_API_BASE: &str = "https://api.urbandictionary.com/v0/";

/// Characters that survive encoding unchanged, besides ASCII alphanumerics.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// What the cursor is currently paging through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Query {
    #[default]
    Empty,
    Term(String),
    Random,
    WordOfTheDay,
}

impl Query {
    /// Builds a term query from user input.
    ///
    /// Newlines become spaces and surrounding whitespace is dropped; blank input
    /// yields [`Query::Empty`].
    pub fn term(input: &str) -> Self {
        let cleaned = input.replace(['\r', '\n'], " ");
        let trimmed = cleaned.trim();
        if trimmed.is_empty() {
            Query::Empty
        } else {
            Query::Term(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Query::Empty)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Empty => write!(f, "nothing"),
            Query::Term(term) => write!(f, "\"{term}\""),
            Query::Random => write!(f, "random words"),
            Query::WordOfTheDay => write!(f, "words of the day"),
        }
    }
}

/// URL templates rooted at one API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL of the zero-based page `page_index` for `query`.
    ///
    /// The service counts pages from one. Random words ignore the page number;
    /// every request returns a fresh batch. [`Query::Empty`] has no URL.
    pub fn page_url(&self, query: &Query, page_index: usize) -> Option<String> {
        let page = page_index + 1;
        match query {
            Query::Empty => None,
            Query::Term(term) => Some(format!(
                "{}define?term={}&page={page}",
                self.base,
                encode_component(term)
            )),
            Query::Random => Some(format!("{}random", self.base)),
            Query::WordOfTheDay => Some(format!("{}words_of_the_day?page={page}", self.base)),
        }
    }

    pub fn autocomplete_url(&self, prefix: &str) -> String {
        format!("{}autocomplete?term={}", self.base, encode_component(prefix))
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

pub(crate) fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}
