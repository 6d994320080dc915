//! Leaderboard aggregation over the denormalized reward rows.
//!
//! Standings derive from the `rewards` aggregate table, not from the
//! transaction ledger: the aggregate tracks points as they are saved,
//! while the ledger drives the spendable balance. The two update via
//! different code paths and are not guaranteed numerically identical.

use serde::Serialize;

use super::ids::UserId;

/// One per-user row of the leaderboard, before or after aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    /// User this standing belongs to.
    pub user_id: UserId,
    /// Summed reward points.
    pub points: i64,
    /// Reward level.
    pub level: i32,
    /// Display name, when the aggregate row recorded one.
    pub user_name: Option<String>,
}

/// Collapses raw reward rows into one standing per user, ranked.
///
/// Duplicate rows for the same user (possible with seeded data) are
/// merged by summing their points; the first-seen level and name win.
/// The result is sorted by points descending with ascending user id as
/// the deterministic tie-break, so rank is the 1-based position.
#[must_use]
pub fn aggregate_standings<I>(rows: I) -> Vec<Standing>
where
    I: IntoIterator<Item = Standing>,
{
    let mut merged: Vec<Standing> = Vec::new();
    for row in rows {
        match merged.iter_mut().find(|s| s.user_id == row.user_id) {
            Some(existing) => existing.points = existing.points.saturating_add(row.points),
            None => merged.push(row),
        }
    }
    merged.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.user_id.get().cmp(&b.user_id.get()))
    });
    merged
}
