//! Pixel ↔ calendar conversion for the board timeline.
//!
//! Every column is one day wide. Offsets are measured in pixels from the
//! left edge of the epoch column. Conversions are total: dates outside the
//! window simply land outside the visible range, and absurd offsets
//! saturate at the calendar bounds.

use chrono::{NaiveDate, TimeDelta};

pub use ganttboard_proto::task::MIN_VISIBLE_DAYS;

/// Default width of one day column in pixels.
pub const DEFAULT_COLUMN_WIDTH: f64 = 120.0;

/// Days shown before today by default.
pub const DEFAULT_HISTORY_DAYS: u32 = 90;

/// Days shown after today by default.
pub const DEFAULT_FORWARD_DAYS: u32 = 90;

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Adds a signed number of days, saturating at the calendar bounds.
#[must_use]
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
}

/// Last calendar day covered by a bar of `visible_days` starting at `start`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn end_date(start: NaiveDate, visible_days: f64) -> NaiveDate {
    add_days(start, visible_days.floor() as i64)
}

/// A fixed day grid anchored at an epoch date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeline {
    epoch: NaiveDate,
    column_width: f64,
    window_days: u32,
}

impl Timeline {
    /// Creates a timeline whose first column is `epoch`.
    ///
    /// A non-finite or non-positive `column_width` falls back to
    /// [`DEFAULT_COLUMN_WIDTH`].
    #[must_use]
    pub fn new(epoch: NaiveDate, column_width: f64, window_days: u32) -> Self {
        let column_width = if column_width.is_finite() && column_width > 0.0 {
            column_width
        } else {
            DEFAULT_COLUMN_WIDTH
        };
        Self {
            epoch,
            column_width,
            window_days: window_days.max(1),
        }
    }

    /// Creates the usual board window: `history_days` before `today`
    /// through `forward_days` after it.
    #[must_use]
    pub fn around(today: NaiveDate, history_days: u32, forward_days: u32, column_width: f64) -> Self {
        let epoch = add_days(today, -i64::from(history_days));
        Self::new(epoch, column_width, history_days + forward_days + 1)
    }

    /// First day of the grid.
    #[must_use]
    pub const fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Width of one day column in pixels.
    #[must_use]
    pub const fn column_width(&self) -> f64 {
        self.column_width
    }

    /// Number of columns in the advisory window.
    #[must_use]
    pub const fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Exact pixel offset of the left edge of `date`'s column.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn date_to_offset(&self, date: NaiveDate) -> f64 {
        (date - self.epoch).num_days() as f64 * self.column_width
    }

    /// Column index nearest to `offset`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn day_index(&self, offset: f64) -> i64 {
        (offset / self.column_width).round() as i64
    }

    /// Date of the column nearest to `offset`.
    #[must_use]
    pub fn offset_to_date(&self, offset: f64) -> NaiveDate {
        add_days(self.epoch, self.day_index(offset))
    }

    /// Pixel width of a bar lasting `days`.
    #[must_use]
    pub fn days_to_width(&self, days: f64) -> f64 {
        days * self.column_width
    }

    /// Duration in days for a bar `width` pixels wide, rounded to two
    /// decimals and never below [`MIN_VISIBLE_DAYS`].
    #[must_use]
    pub fn width_to_days(&self, width: f64) -> f64 {
        round2(width / self.column_width).max(MIN_VISIBLE_DAYS)
    }

    /// Pending delta for a trailing edge dragged to `width` pixels on a bar
    /// whose committed duration is `committed_days`.
    #[must_use]
    pub fn resize_delta(&self, width: f64, committed_days: f64) -> f64 {
        round2(self.width_to_days(width) - committed_days)
    }

    /// Whether `date` falls inside the advisory window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        let idx = (date - self.epoch).num_days();
        (0..i64::from(self.window_days)).contains(&idx)
    }
}
