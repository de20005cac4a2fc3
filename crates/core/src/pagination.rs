//! Page cursor over the effective (post-gating) event total.

use serde::Serialize;

use crate::error::CoreError;

/// Default number of events per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// 1-based inclusive display range. Both ends are 0 for an empty total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageBounds {
    pub start: u64,
    pub end: u64,
}

/// Display range for `current_page` over `total_events`.
pub fn bounds_for(current_page: u32, page_size: u32, total_events: u64) -> PageBounds {
    if total_events == 0 {
        return PageBounds { start: 0, end: 0 };
    }
    let page = u64::from(current_page.max(1));
    let size = u64::from(page_size);
    PageBounds {
        start: (page - 1) * size + 1,
        end: (page * size).min(total_events),
    }
}

/// Number of pages needed for `total_events`.
pub fn total_pages(total_events: u64, page_size: u32) -> u64 {
    total_events.div_ceil(u64::from(page_size.max(1)))
}

/// What [`PaginationController::set_total`] did to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCorrection {
    Unchanged,
    /// The page fell past the last page and was reset to 1; the caller
    /// must fetch page 1.
    ResetToFirst,
}

/// Current page, page size and effective total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationController {
    current_page: u32,
    page_size: u32,
    total_events: u64,
}

impl PaginationController {
    pub fn new(page_size: u32) -> Result<Self, CoreError> {
        if page_size == 0 {
            return Err(CoreError::Validation(
                "Page size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            current_page: 1,
            page_size,
            total_events: 0,
        })
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    pub fn can_next(&self) -> bool {
        u64::from(self.current_page) * u64::from(self.page_size) < self.total_events
    }

    pub fn can_prev(&self) -> bool {
        self.current_page > 1
    }

    /// Advance one page. Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.current_page += 1;
        true
    }

    /// Go back one page. Returns whether the page changed.
    pub fn prev_page(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.current_page -= 1;
        true
    }

    /// Jump to page 1. Returns whether the page changed.
    pub fn reset(&mut self) -> bool {
        let changed = self.current_page != 1;
        self.current_page = 1;
        changed
    }

    /// Record a new effective total and self-correct the cursor.
    ///
    /// A reset happens only when the page is past the last page and is not
    /// already 1, so calling this repeatedly with the same total settles
    /// after at most one reset.
    pub fn set_total(&mut self, total_events: u64) -> PageCorrection {
        self.total_events = total_events;
        let last_page = total_pages(total_events, self.page_size).max(1);
        if u64::from(self.current_page) > last_page && self.reset() {
            PageCorrection::ResetToFirst
        } else {
            PageCorrection::Unchanged
        }
    }

    pub fn bounds(&self) -> PageBounds {
        bounds_for(self.current_page, self.page_size, self.total_events)
    }

    /// Caption shown under the events table.
    pub fn caption(&self) -> String {
        if self.total_events == 0 {
            return "No events found".to_string();
        }
        let PageBounds { start, end } = self.bounds();
        format!(
            "Showing {start} to {end} of {} events",
            self.total_events
        )
    }
}

impl Default for PaginationController {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total_events: 0,
        }
    }
}
