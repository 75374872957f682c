//! Page cursor for a collection.
//!
//! Invariant: `current_page` is always in `[1, total_pages(count)]`, where an
//! empty collection still has one page.

use std::ops::Range;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pager {
    current_page: usize,
    page_size: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, count: usize) -> usize {
        count.div_ceil(self.page_size).max(1)
    }

    /// Pull the cursor back inside the valid range.
    pub fn clamp(&mut self, count: usize) {
        self.current_page = self.current_page.clamp(1, self.total_pages(count));
    }

    /// Move to `page`, clamped.
    pub fn set_page(&mut self, page: usize, count: usize) {
        self.current_page = page;
        self.clamp(count);
    }

    /// Adjust for a row removed from a collection that held `count_before` rows.
    ///
    /// Removing the only row of the last page steps back one page.
    pub fn after_remove(&mut self, count_before: usize) {
        let on_last_page = self.current_page == self.total_pages(count_before);
        if on_last_page && self.current_page > 1 && count_before % self.page_size == 1 {
            self.current_page -= 1;
        }
        self.clamp(count_before.saturating_sub(1));
    }

    /// Index range of the current page within a collection of `count` rows.
    pub fn range(&self, count: usize) -> Range<usize> {
        let start = ((self.current_page - 1) * self.page_size).min(count);
        let end = (start + self.page_size).min(count);
        start..end
    }
}
