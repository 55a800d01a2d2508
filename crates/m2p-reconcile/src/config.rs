use chrono::{Duration, NaiveDateTime, Utc};
use chrono_tz::Asia::Shanghai;

use crate::types::TimeWindow;

/// Business parameters of one reconciliation pass.
///
/// The window and category defaults reproduce the values the job has always
/// run with ("recent changes in one category"); they are configurable per
/// invocation but there is no evidence they generalize to other categories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Window start: this many days before now.
    pub back_days: i64,
    /// Window end: this many days after now. The forward slack tolerates
    /// clock skew between the job host and the MES server.
    pub forward_days: i64,
    /// MES inventory category (`ic_id`) the pass is restricted to.
    pub category_id: i64,
    /// Provenance stamp written to reimported rows.
    pub import_source: String,
    /// Actor stamp written to reimported rows.
    pub entered_by: String,
    /// When true, a failed reimport transaction aborts the whole run instead
    /// of being recorded and skipped.
    pub fail_on_reimport_error: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            back_days: 2,
            forward_days: 1,
            category_id: 270,
            import_source: "robot".to_string(),
            entered_by: "robot".to_string(),
            fail_on_reimport_error: false,
        }
    }
}

impl SyncConfig {
    /// Recency window around an explicit reference instant.
    pub fn window_around(&self, now: NaiveDateTime) -> TimeWindow {
        TimeWindow {
            start: now - Duration::days(self.back_days),
            end: now + Duration::days(self.forward_days),
        }
    }

    /// Recency window around the current Shanghai wall-clock time; both
    /// databases store local DATETIME values in that zone.
    pub fn current_window(&self) -> TimeWindow {
        self.window_around(Utc::now().with_timezone(&Shanghai).naive_local())
    }
}

/// Current wall-clock time in the zone the PLUS DATETIME columns live in.
/// Used for the entered-at provenance stamp.
pub fn local_now() -> NaiveDateTime {
    Utc::now().with_timezone(&Shanghai).naive_local()
}
