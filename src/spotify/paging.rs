//! Follow `next` links until a listing is exhausted.
//!
//! The service returns lists one page at a time. [`paginate`] turns a
//! page-fetching function into a single stream of items, fetching the
//! next page only when the previous one has been consumed.

use std::future::Future;

use futures::stream::{self, Stream, TryStreamExt};

use super::domain::SpotifyError;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// URL of the following page, `None` on the last one
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

enum Cursor {
    Start,
    Next(String),
    Exhausted,
}

/// Stream every item of a paged listing.
///
/// `fetch` is called with `None` for the first page and with the previous
/// page's `next` URL afterwards. An error ends the stream.
pub fn paginate<'a, T, F, Fut>(mut fetch: F) -> impl Stream<Item = Result<T, SpotifyError>> + 'a
where
    T: 'a,
    F: FnMut(Option<String>) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>, SpotifyError>> + 'a,
{
    stream::try_unfold(Cursor::Start, move |cursor| {
        let request = match cursor {
            Cursor::Start => Some(fetch(None)),
            Cursor::Next(url) => Some(fetch(Some(url))),
            Cursor::Exhausted => None,
        };
        async move {
            let Some(request) = request else {
                return Ok::<_, SpotifyError>(None);
            };
            let page = request.await?;
            let cursor = match page.next {
                Some(url) => Cursor::Next(url),
                None => Cursor::Exhausted,
            };
            Ok(Some((page.items, cursor)))
        }
    })
    .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, SpotifyError>)))
    .try_flatten()
}
