mod config;
mod cursor;
mod error;
mod fetch;
mod query;
mod word;

pub use config::{CachePolicy, ClientConfig};
pub use cursor::UrbanCursor;
pub use error::{CursorError, FetchError};
pub use fetch::{FetchWords, HttpFetcher, MemorySource};
pub use query::{DEFAULT_API_BASE, Endpoints, Query};
pub use word::{Page, TextFormat, Word, format_links, parse_definitions, parse_suggestions};
