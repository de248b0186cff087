use crate::config::{CachePolicy, ClientConfig};
use crate::error::{CursorError, FetchError};
use crate::fetch::{FetchWords, HttpFetcher};
use crate::query::{Endpoints, Query};
use crate::word::{Page, Word};
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::{debug, info};

/// Bidirectional cursor over the paged results of one [`Query`].
///
/// Pages are fetched lazily and, depending on the [`CachePolicy`], kept until
/// the query changes. Every navigation that needs a page fetches it before
/// moving, so a failed call never leaves the cursor half way.
///
/// Operations that may touch the network are `async` and take `&mut self`: a
/// cursor serves one caller at a time.
pub struct UrbanCursor<S = HttpFetcher> {
    source: S,
    endpoints: Endpoints,
    query: Query,
    page_index: usize,
    word_index: usize,
    cache: Option<LruCache<usize, Page>>,
}

impl UrbanCursor<HttpFetcher> {
    /// Cursor talking to the live service described by `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self::with_source(fetcher, config))
    }
}

impl<S: FetchWords> UrbanCursor<S> {
    /// Cursor reading pages from an arbitrary source.
    ///
    /// Only `api_base` and `cache` are taken from `config`; transport settings
    /// belong to the source.
    pub fn with_source(source: S, config: &ClientConfig) -> Self {
        Self {
            source,
            endpoints: Endpoints::new(config.api_base.clone()),
            query: Query::Empty,
            page_index: 0,
            word_index: 0,
            cache: new_cache(config.cache),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn word_index(&self) -> usize {
        self.word_index
    }

    /// `(page_index, word_index)`, both zero-based.
    pub fn position(&self) -> (usize, usize) {
        (self.page_index, self.word_index)
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cached_pages(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.len())
    }

    pub fn is_cached(&self, page_index: usize) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|cache| cache.contains(&page_index))
    }

    /// Replaces the query, drops every cached page and rewinds to the first
    /// word of the first page, which is fetched and returned.
    pub async fn set_query(&mut self, query: Query) -> Result<Option<Word>, FetchError> {
        info!(%query, "new query");
        self.query = query;
        self.page_index = 0;
        self.word_index = 0;
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
        self.current_word().await
    }

    /// Looks up a term; blank input clears the query.
    pub async fn define(&mut self, term: &str) -> Result<Option<Word>, FetchError> {
        self.set_query(Query::term(term)).await
    }

    pub async fn random(&mut self) -> Result<Option<Word>, FetchError> {
        self.set_query(Query::Random).await
    }

    pub async fn words_of_the_day(&mut self) -> Result<Option<Word>, FetchError> {
        self.set_query(Query::WordOfTheDay).await
    }

    /// Word under the cursor, fetching the current page if needed.
    pub async fn current_word(&mut self) -> Result<Option<Word>, FetchError> {
        let page = self.current_page().await?;
        Ok(page.get(self.word_index).cloned())
    }

    /// Current page, served from the cache when possible.
    ///
    /// A miss performs a request and, with caching on, stores the result under
    /// the current page index.
    pub async fn current_page(&mut self) -> Result<Page, FetchError> {
        self.page_at(self.page_index).await
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn has_previous_word(&self) -> bool {
        self.word_index > 0 || self.has_previous_page()
    }

    /// Whether the page after the current one has any words.
    ///
    /// The only way to know is to fetch it. The probe goes through the cache,
    /// so a following [`go_to_next_page`](Self::go_to_next_page) is free when
    /// caching is on. The position never changes.
    pub async fn has_next_page(&mut self) -> Result<bool, FetchError> {
        let next = self.page_at(self.page_index + 1).await?;
        Ok(!next.is_empty())
    }

    pub async fn has_next_word(&mut self) -> Result<bool, FetchError> {
        let page = self.current_page().await?;
        if self.word_index + 1 < page.len() {
            return Ok(true);
        }
        self.has_next_page().await
    }

    /// Moves to the first word of the previous page.
    pub async fn go_to_previous_page(&mut self) -> Result<Page, CursorError> {
        if !self.has_previous_page() {
            return Err(CursorError::NoPreviousPage);
        }
        let target = self.page_index - 1;
        let page = self.page_at(target).await?;
        self.page_index = target;
        self.word_index = 0;
        Ok(page)
    }

    /// Steps back one word, crossing onto the last word of the previous page
    /// when at the start of the current one.
    pub async fn go_to_previous_word(&mut self) -> Result<Option<Word>, CursorError> {
        if !self.has_previous_word() {
            return Err(CursorError::NoPreviousWord);
        }
        if self.word_index > 0 {
            let page = self.current_page().await?;
            self.word_index -= 1;
            return Ok(page.get(self.word_index).cloned());
        }
        let target = self.page_index - 1;
        let page = self.page_at(target).await?;
        self.page_index = target;
        self.word_index = page.len().saturating_sub(1);
        Ok(page.get(self.word_index).cloned())
    }

    /// Moves to the first word of the next page.
    ///
    /// The existence probe is also the fetch of the page returned.
    pub async fn go_to_next_page(&mut self) -> Result<Page, CursorError> {
        let target = self.page_index + 1;
        let page = self.page_at(target).await?;
        if page.is_empty() {
            return Err(CursorError::NoNextPage);
        }
        self.page_index = target;
        self.word_index = 0;
        Ok(page)
    }

    /// Steps forward one word, crossing onto the first word of the next page
    /// at the end of the current one.
    pub async fn go_to_next_word(&mut self) -> Result<Option<Word>, CursorError> {
        let page = self.current_page().await?;
        if self.word_index + 1 < page.len() {
            self.word_index += 1;
            return Ok(page.get(self.word_index).cloned());
        }
        match self.go_to_next_page().await {
            Ok(next) => Ok(next.first().cloned()),
            Err(CursorError::NoNextPage) => Err(CursorError::NoNextWord),
            Err(err) => Err(err),
        }
    }

    async fn page_at(&mut self, index: usize) -> Result<Page, FetchError> {
        if let Some(page) = self.cache.as_mut().and_then(|cache| cache.get(&index)) {
            debug!(page = index, "page cache hit");
            return Ok(page.clone());
        }
        let Some(url) = self.endpoints.page_url(&self.query, index) else {
            return Ok(Page::empty(index));
        };
        let words = self.source.fetch_words(&url).await?;
        let page = Page::new(index, words);
        if let Some(cache) = self.cache.as_mut() {
            if let Some((evicted, _)) = cache.push(index, page.clone()) {
                if evicted != index {
                    debug!(page = evicted, "evicted cached page");
                }
            }
        }
        Ok(page)
    }
}

fn new_cache(policy: CachePolicy) -> Option<LruCache<usize, Page>> {
    match policy {
        CachePolicy::Disabled => None,
        CachePolicy::Unbounded => Some(LruCache::unbounded()),
        CachePolicy::Bounded(capacity) => NonZeroUsize::new(capacity).map(LruCache::new),
    }
}
