//! Client-side shaping of the dashboard table: name search and fixed-size pages.

use uuid::Uuid;

use crate::foods::{dto::DashboardPage, repo_types::FoodEntry};

pub const PAGE_SIZE: usize = 10;

/// Entries whose name contains `term`, ignoring case. Order is preserved.
pub fn filter_entries(entries: &[FoodEntry], term: &str) -> Vec<FoodEntry> {
    let needle = term.to_lowercase();
    entries
        .iter()
        .filter(|e| e.foodname.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Half-open index range of `page` within `count` items.
pub fn page_bounds(page: usize, count: usize) -> (usize, usize) {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE).min(count);
    (start, (start + PAGE_SIZE).min(count))
}

/// Loaded entries plus the search term and current page.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    entries: Vec<FoodEntry>,
    search: String,
    page: usize,
}

impl Listing {
    pub fn new(entries: Vec<FoodEntry>) -> Self {
        Self {
            entries,
            search: String::new(),
            page: 1,
        }
    }

    /// A new term always starts over at the first page.
    pub fn search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = clamp_page(page, self.total_pages());
    }

    pub fn filtered(&self) -> Vec<FoodEntry> {
        filter_entries(&self.entries, &self.search)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len())
    }

    pub fn page(&self) -> usize {
        clamp_page(self.page, self.total_pages())
    }

    #[cfg(test)]
    pub fn visible(&self) -> Vec<FoodEntry> {
        let filtered = self.filtered();
        let (start, end) = page_bounds(self.page(), filtered.len());
        filtered[start..end].to_vec()
    }

    /// Drops a deleted entry without reloading the list.
    pub fn remove(&mut self, id: Uuid) -> Option<FoodEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx))
    }

    pub fn view(&self) -> DashboardPage {
        let filtered = self.filtered();
        let total = filtered.len();
        let total_pages = total_pages(total);
        let page = self.page();
        let (start, end) = page_bounds(page, total);
        DashboardPage {
            search: self.search.clone(),
            page,
            total_pages,
            total,
            showing_from: if total == 0 { 0 } else { start + 1 },
            showing_to: end,
            has_prev: page > 1,
            has_next: page < total_pages,
            items: filtered[start..end].to_vec(),
        }
    }
}
