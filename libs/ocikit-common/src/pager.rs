//! Token-based pagination with the Stream API.
//!
//! List operations answer with an `opc-next-page` header; feeding it back as
//! the `page` query parameter fetches the next page. The pagers here hide that
//! loop behind a [`Stream`] of pages or items.
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//!
//! let mut vcns = ItemsPager::new(|page| {
//!     let client = client.clone();
//!     let request = ListVcnsRequest { page, ..base.clone() };
//!     async move {
//!         let resp = client.list_vcns(&ctx, &request).await?;
//!         Ok(Page::new(resp.items, resp.opc_next_page))
//!     }
//! });
//! while let Some(vcn) = vcns.next().await {
//!     println!("{}", vcn?.id);
//! }
//! ```

use futures_core::Stream;
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

/// One page of a list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the following page; `None` on the last page
    pub next_page: Option<String>,
}

impl<T> Page<T> {
    /// An empty token is treated as the last page.
    #[must_use]
    pub fn new(items: Vec<T>, next_page: Option<String>) -> Self {
        Self {
            items,
            next_page: next_page.filter(|token| !token.is_empty()),
        }
    }
}

pin_project! {
    /// Stream of whole pages, fetched on demand.
    ///
    /// The fetcher receives `None` for the first page and the previous
    /// page's token afterwards. The stream ends after the page without a
    /// token, or right after the first error.
    pub struct PagesPager<T, E, F, Fut>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
    {
        next_page: Option<String>,
        done: bool,
        fetcher: F,
        #[pin]
        current_fetch: Option<Fut>,
        _marker: PhantomData<fn() -> (T, E)>,
    }
}

impl<T, E, F, Fut> PagesPager<T, E, F, Fut>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    #[must_use]
    pub fn new(fetcher: F) -> Self {
        Self {
            next_page: None,
            done: false,
            fetcher,
            current_fetch: None,
            _marker: PhantomData,
        }
    }
}

impl<T, E, F, Fut> Stream for PagesPager<T, E, F, Fut>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    type Item = Result<Page<T>, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        if this.current_fetch.is_none() {
            let fut = (this.fetcher)(this.next_page.take());
            this.current_fetch.set(Some(fut));
        }

        let Some(fut) = this.current_fetch.as_mut().as_pin_mut() else {
            return Poll::Ready(None);
        };

        match fut.poll(cx) {
            Poll::Ready(Ok(page)) => {
                this.current_fetch.set(None);
                this.next_page.clone_from(&page.next_page);
                if this.next_page.is_none() {
                    *this.done = true;
                }
                Poll::Ready(Some(Ok(page)))
            }
            Poll::Ready(Err(e)) => {
                this.current_fetch.set(None);
                *this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

pin_project! {
    /// Stream of individual items across all pages.
    pub struct ItemsPager<T, E, F, Fut>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
    {
        next_page: Option<String>,
        buffer: VecDeque<T>,
        done: bool,
        fetcher: F,
        #[pin]
        current_fetch: Option<Fut>,
        _marker: PhantomData<fn() -> E>,
    }
}

impl<T, E, F, Fut> ItemsPager<T, E, F, Fut>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    #[must_use]
    pub fn new(fetcher: F) -> Self {
        Self {
            next_page: None,
            buffer: VecDeque::new(),
            done: false,
            fetcher,
            current_fetch: None,
            _marker: PhantomData,
        }
    }
}

impl<T, E, F, Fut> Stream for ItemsPager<T, E, F, Fut>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(item) = this.buffer.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            if *this.done {
                return Poll::Ready(None);
            }

            if let Some(fut) = this.current_fetch.as_mut().as_pin_mut() {
                match fut.poll(cx) {
                    Poll::Ready(Ok(page)) => {
                        this.current_fetch.set(None);
                        this.next_page.clone_from(&page.next_page);
                        if this.next_page.is_none() {
                            *this.done = true;
                        }
                        this.buffer.extend(page.items);
                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        this.current_fetch.set(None);
                        *this.done = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }

            let fut = (this.fetcher)(this.next_page.take());
            this.current_fetch.set(Some(fut));
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::sync::{Arc, Mutex};

    /// Three pages: [1, 2] -> [3] -> [4, 5]
    fn paged(
        seen: Arc<Mutex<Vec<Option<String>>>>,
    ) -> impl FnMut(Option<String>) -> std::future::Ready<Result<Page<u32>, String>> {
        move |page| {
            seen.lock().unwrap().push(page.clone());
            let result = match page.as_deref() {
                None => Page::new(vec![1, 2], Some("p2".to_owned())),
                Some("p2") => Page::new(vec![3], Some("p3".to_owned())),
                Some("p3") => Page::new(vec![4, 5], None),
                Some(other) => return std::future::ready(Err(format!("bad token {other}"))),
            };
            std::future::ready(Ok(result))
        }
    }

    #[tokio::test]
    async fn test_items_pager_walks_all_pages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let items: Vec<u32> = ItemsPager::new(paged(seen.clone()))
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("p2".to_owned()), Some("p3".to_owned())]
        );
    }

    #[tokio::test]
    async fn test_pages_pager_yields_pages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pages: Vec<Page<u32>> = PagesPager::new(paged(seen))
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].items, vec![3]);
        assert_eq!(pages[2].next_page, None);
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let pager = ItemsPager::new(move |_page: Option<String>| {
            *counter.lock().unwrap() += 1;
            std::future::ready(Err::<Page<u32>, _>("boom".to_owned()))
        });

        let results: Vec<Result<u32, String>> = pager.collect().await;
        assert_eq!(results, vec![Err("boom".to_owned())]);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_token_is_last_page() {
        let pager = PagesPager::new(|_page: Option<String>| {
            std::future::ready(Ok::<_, String>(Page::new(vec![7u32], Some(String::new()))))
        });
        let pages: Vec<_> = pager.collect().await;
        assert_eq!(pages.len(), 1);
    }
}
