//! Pure progress computation.
//!
//! Both the daemon's reconciler and the reader client call these functions,
//! so a page/total pair maps to exactly one progress value and recommended
//! status no matter which side computes it.

use crate::book::ReadingStatus;
use crate::PROGRESS_COMPLETE;

/// Completion percentage for a page position.
///
/// An unknown denominator (`total_pages == 0`) yields 0 rather than a guess,
/// and a page beyond the known total counts as the total.
pub fn progress_of(last_read_page: u32, total_pages: u32) -> u8 {
    if total_pages == 0 {
        return 0;
    }
    let page = u64::from(last_read_page.min(total_pages));
    let pct = page * 100 / u64::from(total_pages);
    pct.min(u64::from(PROGRESS_COMPLETE)) as u8
}

/// Status recommended by a progress value.
///
/// `opened` marks a book that has been opened in a reader at least once;
/// it keeps a just-opened book at `Reading` even while progress is still 0.
pub fn recommended_status(progress: u8, opened: bool) -> ReadingStatus {
    if progress >= PROGRESS_COMPLETE {
        ReadingStatus::Completed
    } else if progress > 0 || opened {
        ReadingStatus::Reading
    } else {
        ReadingStatus::Unread
    }
}

/// Resolve a caller-supplied status against the progress-derived one.
///
/// The explicit value is honored except where it would break
/// `Completed ⇔ progress == 100` (progress is ground truth) or claim
/// `Unread` for a book with recorded progress.
pub fn effective_status(
    explicit: Option<ReadingStatus>,
    progress: u8,
    opened: bool,
) -> ReadingStatus {
    let derived = recommended_status(progress, opened);
    match explicit {
        None => derived,
        Some(_) if progress >= PROGRESS_COMPLETE => ReadingStatus::Completed,
        Some(ReadingStatus::Completed) => derived,
        Some(ReadingStatus::Unread) if progress > 0 => derived,
        Some(status) => status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_table() {
        // (page, total, expected)
        let cases: &[(u32, u32, u8)] = &[
            (0, 0, 0),
            (50, 0, 0),
            (0, 100, 0),
            (1, 100, 1),
            (50, 100, 50),
            (99, 100, 99),
            (100, 100, 100),
            (500, 100, 100),
            (1, 3, 33),
            (2, 3, 66),
            (3, 3, 100),
            (7, 200, 3),
            (10_000, 10_000, 100),
        ];
        for &(page, total, expected) in cases {
            assert_eq!(
                progress_of(page, total),
                expected,
                "progress_of({page}, {total})"
            );
        }
    }

    #[test]
    fn test_progress_is_idempotent() {
        for page in [0u32, 1, 17, 250, 10_000] {
            for total in [0u32, 1, 99, 300, 10_000] {
                assert_eq!(progress_of(page, total), progress_of(page, total));
            }
        }
    }

    #[test]
    fn test_recommended_status() {
        assert_eq!(recommended_status(0, false), ReadingStatus::Unread);
        assert_eq!(recommended_status(0, true), ReadingStatus::Reading);
        assert_eq!(recommended_status(1, false), ReadingStatus::Reading);
        assert_eq!(recommended_status(99, true), ReadingStatus::Reading);
        assert_eq!(recommended_status(100, true), ReadingStatus::Completed);
        assert_eq!(recommended_status(100, false), ReadingStatus::Completed);
    }

    #[test]
    fn test_explicit_status_cannot_fake_completion() {
        assert_eq!(
            effective_status(Some(ReadingStatus::Completed), 40, true),
            ReadingStatus::Reading
        );
        assert_eq!(
            effective_status(Some(ReadingStatus::Completed), 0, false),
            ReadingStatus::Unread
        );
    }

    #[test]
    fn test_explicit_status_cannot_undo_completion() {
        assert_eq!(
            effective_status(Some(ReadingStatus::Reading), 100, true),
            ReadingStatus::Completed
        );
        assert_eq!(
            effective_status(Some(ReadingStatus::Unread), 100, true),
            ReadingStatus::Completed
        );
    }

    #[test]
    fn test_explicit_reading_flips_unread_book() {
        // The Unread -> Reading transition on first open, before any page data.
        assert_eq!(
            effective_status(Some(ReadingStatus::Reading), 0, true),
            ReadingStatus::Reading
        );
    }

    #[test]
    fn test_explicit_unread_refused_once_progress_recorded() {
        assert_eq!(
            effective_status(Some(ReadingStatus::Unread), 30, true),
            ReadingStatus::Reading
        );
        assert_eq!(
            effective_status(Some(ReadingStatus::Unread), 0, false),
            ReadingStatus::Unread
        );
    }
}
