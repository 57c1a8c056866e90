//! # Page Break Decisions
//!
//! The one place that crosses page boundaries. Every block handler asks
//! [`check_add_page`] before it draws, passing its own line height as the
//! space it needs.

use crate::canvas::Canvas;
use crate::model::PageConfig;

use super::Cursor;

/// Outcome of a pagination check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCheck {
    pub cursor: Cursor,
    pub did_add_page: bool,
}

/// Start a new page if `needed` more millimetres would cross the bottom
/// margin. Otherwise the cursor comes back unchanged.
pub fn check_add_page<C: Canvas + ?Sized>(
    canvas: &mut C,
    cursor: Cursor,
    needed: f64,
    page: &PageConfig,
) -> PageCheck {
    if cursor.y + needed > page.bottom_limit() {
        let added = canvas.add_page();
        log::debug!(
            "page break at y={:.1} (needed {:.1}), now on page {}",
            cursor.y,
            needed,
            added + 1
        );
        PageCheck {
            cursor: Cursor {
                page: added,
                y: page.margin.top,
            },
            did_add_page: true,
        }
    } else {
        PageCheck {
            cursor,
            did_add_page: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PdfCanvas;
    use crate::model::PageSize;

    #[test]
    fn everything_fits() {
        let mut canvas = PdfCanvas::new(PageSize::A4);
        let page = PageConfig::default();
        let cursor = Cursor { page: 0, y: 100.0 };
        let check = check_add_page(&mut canvas, cursor, 5.0, &page);
        assert_eq!(check.cursor, cursor);
        assert!(!check.did_add_page);
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn exact_fit_stays_on_page() {
        let mut canvas = PdfCanvas::new(PageSize::A4);
        let page = PageConfig::default();
        let check = check_add_page(&mut canvas, Cursor { page: 0, y: 272.0 }, 5.0, &page);
        assert!(!check.did_add_page);
    }

    #[test]
    fn overflow_adds_page_and_resets_to_top_margin() {
        let mut canvas = PdfCanvas::new(PageSize::A4);
        let page = PageConfig::default();
        let check = check_add_page(&mut canvas, Cursor { page: 0, y: 275.0 }, 5.0, &page);
        assert!(check.did_add_page);
        assert_eq!(check.cursor, Cursor { page: 1, y: 20.0 });
        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.current_page(), 1);
    }
}
