//! Snapshot selection for a report window.

use chrono::{Local, NaiveDateTime, TimeZone};

use crate::error::GatherError;
use crate::ocp::ControlPlane;
use crate::timeutil::utc_to_local_in;
use crate::window::TimeWindow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub snapshot_id: i64,
    /// Local wall-clock time.
    pub snapshot_time: NaiveDateTime,
}

/// First and last snapshot of a selection; the bounds of one AWR report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRange {
    pub start: Snapshot,
    pub end: Snapshot,
    pub count: usize,
}

/// Fetch the snapshot inventory and keep the entries inside the (possibly
/// widened) window, ordered by time.
pub fn select_snapshots(
    control_plane: &dyn ControlPlane,
    cluster_name: &str,
    window: &TimeWindow,
) -> Result<Vec<Snapshot>, GatherError> {
    select_snapshots_in(control_plane, cluster_name, window, &Local)
}

pub(crate) fn select_snapshots_in<Tz: TimeZone>(
    control_plane: &dyn ControlPlane,
    cluster_name: &str,
    window: &TimeWindow,
    tz: &Tz,
) -> Result<Vec<Snapshot>, GatherError> {
    let effective = window.widened();
    if effective != *window {
        tracing::info!(
            cluster = %cluster_name,
            requested = %window,
            effective = %effective,
            "window shorter than one hour, widened to catch snapshots"
        );
    }

    let mut selected = Vec::new();
    for entry in control_plane.list_snapshots()? {
        let snapshot_time = match utc_to_local_in(&entry.snapshot_time, tz) {
            Ok(time) => time,
            Err(err) => {
                tracing::warn!(
                    cluster = %cluster_name,
                    snapshot_id = entry.snapshot_id,
                    snapshot_time = %entry.snapshot_time,
                    error = %err,
                    "get snapshot failed, skipping entry"
                );
                continue;
            }
        };
        if effective.contains(snapshot_time) {
            selected.push(Snapshot {
                snapshot_id: entry.snapshot_id,
                snapshot_time,
            });
        }
    }
    selected.sort_by(|a, b| {
        a.snapshot_time
            .cmp(&b.snapshot_time)
            .then_with(|| a.snapshot_id.cmp(&b.snapshot_id))
    });
    tracing::debug!(cluster = %cluster_name, count = selected.len(), "selected snapshots");
    Ok(selected)
}

pub fn report_range(snapshots: &[Snapshot]) -> Result<SnapshotRange, GatherError> {
    match snapshots {
        [start, .., end] => Ok(SnapshotRange {
            start: start.clone(),
            end: end.clone(),
            count: snapshots.len(),
        }),
        _ => Err(GatherError::InsufficientSnapshots {
            found: snapshots.len(),
        }),
    }
}

pub fn select_report_range(
    control_plane: &dyn ControlPlane,
    cluster_name: &str,
    window: &TimeWindow,
) -> Result<SnapshotRange, GatherError> {
    report_range(&select_snapshots(control_plane, cluster_name, window)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocp::SnapshotEntry;
    use crate::test_support::FakeControlPlane;
    use crate::timeutil::parse_datetime;
    use chrono::Utc;

    fn dt(raw: &str) -> NaiveDateTime {
        parse_datetime(raw).unwrap()
    }

    fn entry(id: i64, time: &str) -> SnapshotEntry {
        SnapshotEntry {
            snapshot_id: id,
            snapshot_time: time.to_string(),
        }
    }

    fn window(from: &str, to: &str) -> TimeWindow {
        TimeWindow {
            from: dt(from),
            to: dt(to),
        }
    }

    #[test]
    fn keeps_entries_inside_window_in_time_order() {
        let fake = FakeControlPlane::new().with_snapshots(vec![
            entry(3, "2023-01-01T02:00:00.000Z"),
            entry(1, "2023-01-01T00:00:00.000Z"),
            entry(9, "2023-01-02T00:00:00.000Z"),
            entry(2, "2023-01-01T01:00:00.000Z"),
        ]);
        let selected = select_snapshots_in(
            &fake,
            "c1",
            &window("2023-01-01 00:00:00", "2023-01-01 02:00:00"),
            &Utc,
        )
        .unwrap();
        let ids: Vec<i64> = selected.iter().map(|s| s.snapshot_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(selected[0].snapshot_time, dt("2023-01-01 00:00:00"));
    }

    #[test]
    fn malformed_timestamps_are_skipped() {
        let fake = FakeControlPlane::new().with_snapshots(vec![
            entry(1, "2023-01-01T00:30:00.000Z"),
            entry(2, "not-a-time"),
            entry(3, "2023-01-01T01:30:00.000Z"),
        ]);
        let selected = select_snapshots_in(
            &fake,
            "c1",
            &window("2023-01-01 00:00:00", "2023-01-01 03:00:00"),
            &Utc,
        )
        .unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn narrow_window_is_widened_before_filtering() {
        let fake = FakeControlPlane::new().with_snapshots(vec![
            entry(1, "2023-01-01T10:00:00.000Z"),
            entry(2, "2023-01-01T11:00:00.000Z"),
            entry(3, "2023-01-01T11:04:00.000Z"),
        ]);
        let selected = select_snapshots_in(
            &fake,
            "c1",
            &window("2023-01-01 10:20:00", "2023-01-01 10:40:00"),
            &Utc,
        )
        .unwrap();
        let ids: Vec<i64> = selected.iter().map(|s| s.snapshot_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn single_snapshot_is_insufficient() {
        let fake = FakeControlPlane::new().with_snapshots(vec![
            entry(1, "2023-01-01T00:30:00.000Z"),
            entry(2, "2023-03-01T00:30:00.000Z"),
        ]);
        let selected = select_snapshots_in(
            &fake,
            "c1",
            &window("2023-01-01 00:00:00", "2023-01-01 03:00:00"),
            &Utc,
        )
        .unwrap();
        let err = report_range(&selected).unwrap_err();
        assert!(matches!(err, GatherError::InsufficientSnapshots { found: 1 }), "{err:?}");
        assert!(fake.submissions().is_empty());
    }

    #[test]
    fn range_spans_first_and_last() {
        let snapshots = vec![
            Snapshot { snapshot_id: 1, snapshot_time: dt("2023-01-01 00:00:00") },
            Snapshot { snapshot_id: 2, snapshot_time: dt("2023-01-01 00:30:00") },
            Snapshot { snapshot_id: 3, snapshot_time: dt("2023-01-01 01:00:00") },
        ];
        let range = report_range(&snapshots).unwrap();
        assert_eq!(range.start.snapshot_id, 1);
        assert_eq!(range.end.snapshot_id, 3);
        assert_eq!(range.count, 3);
        assert!(report_range(&[]).is_err());
    }

    #[test]
    fn inventory_failure_propagates() {
        let fake = FakeControlPlane::new().with_snapshot_error("503 Service Unavailable");
        let err = select_snapshots(&fake, "c1", &window("2023-01-01 00:00:00", "2023-01-01 03:00:00"))
            .unwrap_err();
        assert!(matches!(err, GatherError::ControlPlane(_)), "{err:?}");
    }
}
