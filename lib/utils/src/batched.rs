use std::{future::Future, ops};

use futures::future;

/// Reads an indexed collection in windows of a fixed size.
///
/// All elements of a window are fetched concurrently, and the next window is started only after
/// the previous one has completed. Thus, at most `batch_size` fetches are in flight at any time.
/// The first failed fetch aborts the whole read; its error is returned as is, and the results
/// of other fetches are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchedReader {
    batch_size: usize,
}

impl BatchedReader {
    /// # Panics
    ///
    /// Panics if `batch_size` is zero.
    pub const fn new(batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Self { batch_size }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Splits `0..count` into consecutive windows of at most `batch_size` indices.
    pub fn windows(&self, count: usize) -> impl Iterator<Item = ops::Range<usize>> {
        let batch_size = self.batch_size;
        (0..count)
            .step_by(batch_size)
            .map(move |start| start..(start + batch_size).min(count))
    }

    /// Fetches `count` elements, returning them in the index order regardless of the order
    /// in which the fetches complete. If `count` is zero, `fetch` is never called.
    pub async fn read<T, E, F, Fut>(&self, count: usize, mut fetch: F) -> Result<Vec<T>, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut output = Vec::with_capacity(count);
        for window in self.windows(count) {
            // `try_join_all` preserves the order of the input futures.
            let values = future::try_join_all(window.map(&mut fetch)).await?;
            output.extend(values);
        }
        Ok(output)
    }

    /// Reads a paginated collection of `count` elements, where a single fetch covers a page
    /// of at most `page_size` elements, and accumulates page results using `merge`.
    /// Up to `batch_size` pages are fetched concurrently; pages are merged in the order
    /// of their offsets.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    pub async fn fold_pages<T, A, E, F, Fut>(
        &self,
        count: usize,
        page_size: usize,
        init: A,
        mut fetch: F,
        mut merge: impl FnMut(A, T) -> A,
    ) -> Result<A, E>
    where
        F: FnMut(usize, usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        assert!(page_size > 0, "page size must be positive");
        let page_count = count.div_ceil(page_size);
        let pages = self
            .read(page_count, |page| {
                let offset = page * page_size;
                let limit = page_size.min(count - offset);
                fetch(offset, limit)
            })
            .await?;
        Ok(pages.into_iter().fold(init, &mut merge))
    }
}
