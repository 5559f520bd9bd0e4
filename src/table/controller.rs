//! Request-parameter state machine for one paginated table.
//!
//! The controller owns the page index, page size, sort and submitted
//! search of a single screen. It never sees row data: every change it
//! reports is answered by re-issuing the bound read query with the new
//! `PageParams` (server-pagination mode), so the table only ever holds the
//! page the server sent.

use crate::api::types::{PageParams, SortDirection, SortSpec};
use crate::resources::Column;

/// Page size options, cycled in order.
pub const PAGE_SIZES: &[u64] = &[20, 50, 100];

#[derive(Debug, Clone)]
pub struct TableController {
  page: u64,
  page_size: u64,
  sort: Option<SortSpec>,
  search: String,
}

impl TableController {
  pub fn new(page_size: u64) -> Self {
    Self {
      page: 0,
      page_size: page_size.max(1),
      sort: None,
      search: String::new(),
    }
  }

  pub fn page(&self) -> u64 {
    self.page
  }

  pub fn page_size(&self) -> u64 {
    self.page_size
  }

  pub fn sort(&self) -> Option<&SortSpec> {
    self.sort.as_ref()
  }

  pub fn search(&self) -> &str {
    &self.search
  }

  /// Parameters for the read query in its current state.
  pub fn params(&self) -> PageParams {
    PageParams {
      page: self.page,
      page_size: self.page_size,
      sort: self.sort.clone(),
      search: self.search.clone(),
    }
  }

  /// Number of pages for a server-reported total (at least 1).
  pub fn page_count(&self, total: u64) -> u64 {
    total.div_ceil(self.page_size).max(1)
  }

  /// Advance one page. Returns `true` if the parameters changed.
  pub fn next_page(&mut self, total: u64) -> bool {
    if self.page + 1 < self.page_count(total) {
      self.page += 1;
      true
    } else {
      false
    }
  }

  /// Go back one page. Returns `true` if the parameters changed.
  pub fn prev_page(&mut self) -> bool {
    if self.page > 0 {
      self.page -= 1;
      true
    } else {
      false
    }
  }

  /// Cycle through the page size options. Changing size resets to page 0.
  pub fn cycle_page_size(&mut self) -> bool {
    let next = PAGE_SIZES
      .iter()
      .position(|&s| s == self.page_size)
      .map(|i| PAGE_SIZES[(i + 1) % PAGE_SIZES.len()])
      .unwrap_or(PAGE_SIZES[0]);
    self.set_page_size(next)
  }

  pub fn set_page_size(&mut self, page_size: u64) -> bool {
    let page_size = page_size.max(1);
    if page_size == self.page_size {
      return false;
    }
    self.page_size = page_size;
    self.page = 0;
    true
  }

  /// Cycle the sort state across the sortable columns:
  /// unsorted -> col A asc -> col A desc -> col B asc -> ... -> unsorted.
  pub fn cycle_sort(&mut self, columns: &[Column]) -> bool {
    let sortable: Vec<&Column> = columns.iter().filter(|c| c.sortable).collect();
    if sortable.is_empty() {
      return false;
    }

    self.sort = match self.sort.take() {
      None => Some(SortSpec {
        field: sortable[0].field.to_string(),
        direction: SortDirection::Asc,
      }),
      Some(current) => {
        let index = sortable.iter().position(|c| c.field == current.field);
        match (index, current.direction) {
          (Some(_), SortDirection::Asc) => Some(SortSpec {
            field: current.field,
            direction: SortDirection::Desc,
          }),
          (Some(i), SortDirection::Desc) => {
            // Move to the next sortable column, or wrap around to unsorted
            sortable.get(i + 1).map(|c| SortSpec {
              field: c.field.to_string(),
              direction: SortDirection::Asc,
            })
          }
          // Sorted by a column that no longer exists: start over
          (None, _) => Some(SortSpec {
            field: sortable[0].field.to_string(),
            direction: SortDirection::Asc,
          }),
        }
      }
    };
    self.page = 0;
    true
  }

  /// Apply a submitted search string. Returns `true` if the parameters
  /// changed; an unchanged search (including empty over empty) is a no-op
  /// so no request is issued.
  pub fn submit_search(&mut self, search: String) -> bool {
    if search == self.search {
      return false;
    }
    self.search = search;
    self.page = 0;
    true
  }

  /// Cosmetic 1-based row number for a row offset on the current page.
  /// Carries no identity; recomputed whenever the page data changes.
  pub fn row_number(&self, offset: usize) -> u64 {
    self.page * self.page_size + offset as u64 + 1
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::DONORS;

  #[test]
  fn test_paging_bounds() {
    let mut table = TableController::new(20);
    assert!(!table.prev_page());

    // 45 rows -> 3 pages of 20
    assert_eq!(table.page_count(45), 3);
    assert!(table.next_page(45));
    assert!(table.next_page(45));
    assert!(!table.next_page(45), "page 2 is the last page");
    assert_eq!(table.page(), 2);

    assert!(table.prev_page());
    assert_eq!(table.page(), 1);
  }

  #[test]
  fn test_page_size_change_resets_page() {
    let mut table = TableController::new(20);
    table.next_page(200);
    table.next_page(200);
    assert_eq!(table.page(), 2);

    assert!(table.set_page_size(50));
    assert_eq!(table.page(), 0);
    assert_eq!(table.page_size(), 50);

    // Same size again: no parameter change, no request
    assert!(!table.set_page_size(50));
  }

  #[test]
  fn test_cycle_page_size_walks_options() {
    let mut table = TableController::new(20);
    table.cycle_page_size();
    assert_eq!(table.page_size(), 50);
    table.cycle_page_size();
    assert_eq!(table.page_size(), 100);
    table.cycle_page_size();
    assert_eq!(table.page_size(), 20);
  }

  #[test]
  fn test_row_number_offset() {
    let mut table = TableController::new(20);
    table.next_page(100);
    table.next_page(100);
    // page=2, pageSize=20: first visible row is numbered 41
    assert_eq!(table.row_number(0), 41);
    assert_eq!(table.row_number(19), 60);
  }

  #[test]
  fn test_sort_cycle() {
    let mut table = TableController::new(20);

    table.cycle_sort(DONORS.columns);
    let sort = table.sort().expect("sorted");
    assert_eq!(sort.field, "name");
    assert_eq!(sort.direction, SortDirection::Asc);

    table.cycle_sort(DONORS.columns);
    let sort = table.sort().expect("sorted");
    assert_eq!(sort.field, "name");
    assert_eq!(sort.direction, SortDirection::Desc);

    table.cycle_sort(DONORS.columns);
    let sort = table.sort().expect("sorted");
    assert_eq!(sort.field, "email");

    // Walk the rest of the way around: two more sortable columns, then off
    for _ in 0..4 {
      table.cycle_sort(DONORS.columns);
    }
    assert!(table.sort().is_none());
  }

  #[test]
  fn test_sort_resets_page() {
    let mut table = TableController::new(20);
    table.next_page(100);
    table.cycle_sort(DONORS.columns);
    assert_eq!(table.page(), 0);
  }

  #[test]
  fn test_search_submission() {
    let mut table = TableController::new(20);
    table.next_page(100);

    assert!(table.submit_search("saplings".to_string()));
    assert_eq!(table.page(), 0);
    assert_eq!(table.params().search, "saplings");

    // Empty submit returns the unfiltered first page
    table.next_page(100);
    assert!(table.submit_search(String::new()));
    assert_eq!(table.page(), 0);
    assert_eq!(table.params().search, "");

    // Submitting the same search again issues no request
    assert!(!table.submit_search(String::new()));
  }

  #[test]
  fn test_params_reflect_state() {
    let mut table = TableController::new(20);
    table.next_page(100);
    let params = table.params();
    assert_eq!(params.page, 1);
    assert_eq!(params.page_size, 20);
    assert!(params.sort.is_none());
  }
}
