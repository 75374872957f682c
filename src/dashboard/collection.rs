//! Client-side cache for one dashboard collection.
//!
//! Mutations are pure functions over the item list so they can be tested
//! without any network timing. Fetches are fenced by a generation counter:
//! only the response to the most recent `begin_fetch` is applied.

use serde::Serialize;

use super::pagination::Pager;
use crate::models::Keyed;

/// A local edit following a successful backend call.
#[derive(Debug, Clone)]
pub enum Mutation<T: Keyed> {
    /// Add a new row at the top, or replace the row with the same key.
    Insert(T),
    /// Swap the row with the same key in place.
    Replace(T),
    /// Drop the row with this key.
    Remove(T::Key),
}

/// Apply one mutation.
pub fn reduce<T: Keyed>(mut items: Vec<T>, mutation: Mutation<T>) -> Vec<T> {
    match mutation {
        Mutation::Insert(item) => {
            let key = item.key();
            match items.iter().position(|i| i.key() == key) {
                Some(pos) => items[pos] = item,
                None => items.insert(0, item),
            }
        }
        Mutation::Replace(item) => {
            let key = item.key();
            if let Some(pos) = items.iter().position(|i| i.key() == key) {
                items[pos] = item;
            }
        }
        Mutation::Remove(key) => items.retain(|i| i.key() != key),
    }
    items
}

/// Proof that a fetch was started; carries the generation it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch was started after this one; the response was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    loading: bool,
    loaded: bool,
    generation: u64,
    pager: Pager,
}

impl<T: Keyed + Clone> Collection<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            loaded: false,
            generation: 0,
            pager: Pager::new(page_size),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// At least one fetch has completed, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn pager(&self) -> Pager {
        self.pager
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|i| &i.key() == key)
    }

    /// Rows on the current page.
    pub fn page_items(&self) -> &[T] {
        &self.items[self.pager.range(self.items.len())]
    }

    pub fn set_page(&mut self, page: usize) {
        self.pager.set_page(page, self.items.len());
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        FetchTicket(self.generation)
    }

    /// Apply a fetch result. `None` means the fetch failed: the list is left empty.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, result: Option<Vec<T>>) -> FetchOutcome {
        if ticket.0 != self.generation {
            return FetchOutcome::Stale;
        }
        self.loading = false;
        self.loaded = true;
        self.items = result.unwrap_or_default();
        self.pager.clamp(self.items.len());
        FetchOutcome::Applied
    }

    /// Forget everything loaded so far. The next `open_tab` fetches again, and
    /// fetches still in flight come back stale.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.loading = false;
        self.loaded = false;
        self.pager = Pager::new(self.pager.page_size());
    }

    pub fn apply(&mut self, mutation: Mutation<T>) {
        let count_before = self.items.len();
        let is_remove = matches!(mutation, Mutation::Remove(_));
        let exists = match &mutation {
            Mutation::Remove(key) => self.get(key).is_some(),
            _ => false,
        };

        self.items = reduce(std::mem::take(&mut self.items), mutation);

        if is_remove && exists {
            self.pager.after_remove(count_before);
        } else {
            self.pager.clamp(self.items.len());
        }
    }

    /// Edit one row in place, if present.
    pub fn update<F: FnOnce(&mut T)>(&mut self, key: &T::Key, edit: F) -> bool {
        match self.items.iter_mut().find(|i| &i.key() == key) {
            Some(item) => {
                edit(item);
                true
            }
            None => false,
        }
    }
}

/// Serializable snapshot of the current page of a collection.
#[derive(Debug, Clone, Serialize)]
pub struct PageView<V> {
    pub items: Vec<V>,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total: usize,
    pub loading: bool,
}

impl<T: Keyed + Clone> Collection<T> {
    pub fn view<V, F: Fn(&T) -> V>(&self, render: F) -> PageView<V> {
        PageView {
            items: self.page_items().iter().map(render).collect(),
            current_page: self.pager.current_page(),
            total_pages: self.pager.total_pages(self.items.len()),
            page_size: self.pager.page_size(),
            total: self.items.len(),
            loading: self.loading,
        }
    }
}
