//! Tab bar overflow layout.
//!
//! Pure width arithmetic over pre-measured cells; styling happens in the
//! renderer. When every tab fits they are all shown. Otherwise a window
//! grows outward from the active tab and `…` markers flag hidden tabs on
//! either side.

use unicode_width::UnicodeWidthStr;

use crate::constants::{OVERFLOW_MARKER, TAB_CELL_PADDING};

/// Text inside a tab cell, before style padding.
pub fn cell_label(title: &str) -> String {
    format!(" {} ", title)
}

/// Rendered width of one tab cell in terminal columns.
pub fn cell_width(title: &str) -> usize {
    cell_label(title).width() + TAB_CELL_PADDING
}

/// Rendered width of one overflow marker.
pub fn marker_width() -> usize {
    OVERFLOW_MARKER.width() + TAB_CELL_PADDING
}

/// Visible window `[left, right]` plus whether each side hides tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabBarLayout {
    pub left: usize,
    pub right: usize,
    pub left_overflow: bool,
    pub right_overflow: bool,
}

/// One item of the rendered bar, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabCell {
    Overflow,
    Tab(usize),
}

impl TabBarLayout {
    fn new(left: usize, right: usize, count: usize) -> Self {
        Self {
            left,
            right,
            left_overflow: left > 0,
            right_overflow: right + 1 < count,
        }
    }

    pub fn cells(&self) -> Vec<TabCell> {
        let mut cells = Vec::with_capacity(self.right - self.left + 3);
        if self.left_overflow {
            cells.push(TabCell::Overflow);
        }
        cells.extend((self.left..=self.right).map(TabCell::Tab));
        if self.right_overflow {
            cells.push(TabCell::Overflow);
        }
        cells
    }
}

/// Lay out cells of `widths` in `width` columns around `active`.
///
/// Returns `None` when there is nothing to draw (no tabs or zero width).
/// The active tab is always inside the window, even when it alone is wider
/// than the bar.
pub fn layout(widths: &[usize], active: usize, width: usize, marker: usize) -> Option<TabBarLayout> {
    let count = widths.len();
    if count == 0 || width == 0 {
        return None;
    }
    let active = active.min(count - 1);

    let total: usize = widths.iter().sum();
    if total <= width {
        return Some(TabBarLayout::new(0, count - 1, count));
    }

    let (mut left, mut right) = (active, active);
    let mut used = widths[active];
    loop {
        let mut grew = false;
        if left > 0 && used + widths[left - 1] <= width {
            left -= 1;
            used += widths[left];
            grew = true;
        }
        if right + 1 < count && used + widths[right + 1] <= width {
            right += 1;
            used += widths[right];
            grew = true;
        }
        if !grew {
            break;
        }
    }

    let markers = |l: usize, r: usize| {
        let mut cost = 0;
        if l > 0 {
            cost += marker;
        }
        if r + 1 < count {
            cost += marker;
        }
        cost
    };

    // Shrink toward the active tab, right end first.
    while used + markers(left, right) > width && (left < active || right > active) {
        if right > active {
            used -= widths[right];
            right -= 1;
        } else {
            used -= widths[left];
            left += 1;
        }
    }

    Some(TabBarLayout::new(left, right, count))
}

/// Convenience over [`layout`] for raw titles.
pub fn layout_titles(titles: &[&str], active: usize, width: usize) -> Option<TabBarLayout> {
    let widths: Vec<usize> = titles.iter().map(|t| cell_width(t)).collect();
    layout(&widths, active, width, marker_width())
}
