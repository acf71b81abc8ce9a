//! Member directory projection: search filter, stable sort and fixed-size
//! pages over an immutable member snapshot.

use std::{cmp::Ordering, sync::Arc};

use shared::domain::{Member, SortDirection, SortField};

pub const PAGE_SIZE: usize = 10;

/// Most recently fetched member collection. Replaced wholesale, never patched.
pub type Snapshot = Arc<[Member]>;

pub fn empty_snapshot() -> Snapshot {
    Arc::from(Vec::new())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub search_term: String,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub current_page: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldMatches {
    pub name: bool,
    pub surname: bool,
    pub email: bool,
}

impl FieldMatches {
    pub fn any(&self) -> bool {
        self.name || self.surname || self.email
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    Unsorted,
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRow<'a> {
    /// 1-based position within the filtered, sorted list.
    pub position: usize,
    pub member: &'a Member,
    pub matches: FieldMatches,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection<'a> {
    pub rows: Vec<DirectoryRow<'a>>,
    pub total_members: usize,
    pub total_filtered: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_start_index: usize,
    pub page_end_index_exclusive: usize,
}

impl<'a> Projection<'a> {
    pub fn visible_members(&self) -> impl Iterator<Item = &'a Member> + '_ {
        self.rows.iter().map(|row| row.member)
    }

    pub fn is_empty(&self) -> bool {
        self.total_filtered == 0
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 0
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page + 1 < self.total_pages
    }

    /// `(1-based page, total pages)`, or `None` when there is nothing to page.
    pub fn page_label(&self) -> Option<(usize, usize)> {
        (self.total_pages > 0).then(|| (self.current_page + 1, self.total_pages))
    }

    /// Fraction of pages reached, for progress-style indicators. `None` when
    /// there are no pages.
    pub fn page_fraction(&self) -> Option<f64> {
        self.page_label()
            .map(|(page, total)| page as f64 / total as f64)
    }
}

pub fn page_count(total_filtered: usize) -> usize {
    total_filtered.div_ceil(PAGE_SIZE)
}

pub fn match_fields(member: &Member, needle_lower: &str) -> FieldMatches {
    FieldMatches {
        name: member.name.to_lowercase().contains(needle_lower),
        surname: member.surname.to_lowercase().contains(needle_lower),
        email: member.email.to_lowercase().contains(needle_lower),
    }
}

pub fn filter_members<'a>(members: &'a [Member], search_term: &str) -> Vec<&'a Member> {
    if search_term.is_empty() {
        return members.iter().collect();
    }

    let needle = search_term.to_lowercase();
    members
        .iter()
        .filter(|member| match_fields(member, &needle).any())
        .collect()
}

/// Stable sort on the lower-cased key. Descending negates the comparator
/// instead of reversing the output, so equal keys keep their input order
/// in both directions.
pub fn sort_members(members: &mut [&Member], field: SortField, direction: SortDirection) {
    members.sort_by(|a, b| {
        let ordering = compare_keys(a.sort_key(field), b.sort_key(field));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[derive(Debug, Clone)]
pub struct DirectoryEngine {
    snapshot: Snapshot,
    view: ViewState,
}

impl Default for DirectoryEngine {
    fn default() -> Self {
        Self::new(empty_snapshot())
    }
}

impl DirectoryEngine {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            view: ViewState::default(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Swaps in a freshly fetched snapshot. View state survives; the page is
    /// clamped into the new range.
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.go_to_page(self.view.current_page);
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.view = ViewState {
            search_term: term.into(),
            current_page: 0,
            ..self.view.clone()
        };
    }

    pub fn clear_search(&mut self) {
        self.set_search_term(String::new());
    }

    pub fn set_sort(&mut self, field: SortField) {
        let sort_direction = if self.view.sort_field == field {
            self.view.sort_direction.toggled()
        } else {
            SortDirection::Asc
        };
        self.view = ViewState {
            sort_field: field,
            sort_direction,
            current_page: 0,
            ..self.view.clone()
        };
    }

    /// Sets field and direction outright instead of toggling. Resets the
    /// page like [`Self::set_sort`].
    pub fn sort_by(&mut self, field: SortField, direction: SortDirection) {
        self.view = ViewState {
            sort_field: field,
            sort_direction: direction,
            current_page: 0,
            ..self.view.clone()
        };
    }

    pub fn go_to_page(&mut self, index: usize) {
        let last_page = self.total_pages().saturating_sub(1);
        self.view.current_page = index.min(last_page);
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.view.current_page.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.view.current_page.saturating_sub(1));
    }

    pub fn total_filtered(&self) -> usize {
        filter_members(&self.snapshot, &self.view.search_term).len()
    }

    pub fn total_pages(&self) -> usize {
        page_count(self.total_filtered())
    }

    pub fn sort_indicator(&self, field: SortField) -> SortIndicator {
        if self.view.sort_field != field {
            return SortIndicator::Unsorted;
        }
        match self.view.sort_direction {
            SortDirection::Asc => SortIndicator::Ascending,
            SortDirection::Desc => SortIndicator::Descending,
        }
    }

    pub fn compute_view(&self) -> Projection<'_> {
        let mut filtered = filter_members(&self.snapshot, &self.view.search_term);
        sort_members(
            &mut filtered,
            self.view.sort_field,
            self.view.sort_direction,
        );

        let total_filtered = filtered.len();
        let total_pages = page_count(total_filtered);
        let current_page = self.view.current_page.min(total_pages.saturating_sub(1));
        let page_start_index = (current_page * PAGE_SIZE).min(total_filtered);
        let page_end_index_exclusive = (page_start_index + PAGE_SIZE).min(total_filtered);

        let needle = self.view.search_term.to_lowercase();
        let rows = filtered[page_start_index..page_end_index_exclusive]
            .iter()
            .enumerate()
            .map(|(offset, &member)| DirectoryRow {
                position: page_start_index + offset + 1,
                member,
                matches: if needle.is_empty() {
                    FieldMatches::default()
                } else {
                    match_fields(member, &needle)
                },
            })
            .collect();

        Projection {
            rows,
            total_members: self.snapshot.len(),
            total_filtered,
            total_pages,
            current_page,
            page_start_index,
            page_end_index_exclusive,
        }
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
