//! Change detection for placement commits.

use ganttboard_proto::event::{ChangeEvent, EventKind};
use ganttboard_proto::task::{Placement, TaskId};

use crate::geometry::end_date;

const DAY_TOLERANCE: f64 = 1e-9;

/// Display format for dates in change-log values.
pub const EVENT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Whether `current` is the placement already acknowledged as `last_good`.
#[must_use]
pub fn is_noop(last_good: &Placement, current: &Placement) -> bool {
    last_good.start == current.start
        && (last_good.visible_days - current.visible_days).abs() < DAY_TOLERANCE
}

/// Change-log events describing how a bar moved from `last_good` to
/// `current`: one for a new start date, one for a new end date.
#[must_use]
pub fn placement_events(
    task_id: &TaskId,
    last_good: &Placement,
    current: &Placement,
    timestamp: u64,
) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    if last_good.start != current.start {
        events.push(
            ChangeEvent::new(EventKind::Edit, task_id.clone(), timestamp)
                .with_values(
                    last_good.start.format(EVENT_DATE_FORMAT).to_string(),
                    current.start.format(EVENT_DATE_FORMAT).to_string(),
                )
                .with_comment("start date changed (drag)"),
        );
    }

    if (last_good.visible_days - current.visible_days).abs() >= DAY_TOLERANCE {
        let old_end = end_date(last_good.start, last_good.visible_days);
        let new_end = end_date(current.start, current.visible_days);
        events.push(
            ChangeEvent::new(EventKind::Edit, task_id.clone(), timestamp)
                .with_values(
                    old_end.format(EVENT_DATE_FORMAT).to_string(),
                    new_end.format(EVENT_DATE_FORMAT).to_string(),
                )
                .with_comment("end date changed (resize)"),
        );
    }

    events
}
