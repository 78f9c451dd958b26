use crate::models::{Item, ItemCount, LogEntry};
use chrono::{DateTime, NaiveTime, Offset, TimeDelta, TimeZone};

// Zone transitions fall on quarter hours.
const GAP_STEP_MINUTES: i64 = 15;

/// Epoch milliseconds of the first local instant on the calendar day of `now`.
///
/// "Local" is the zone `now` carries. Normally that is midnight; when midnight
/// falls into a DST gap the day starts where the gap ends.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let tz = now.timezone();
    let midnight = now.date_naive().and_time(NaiveTime::MIN);

    let steps_per_day = 24 * 60 / GAP_STEP_MINUTES;
    for step in 0..steps_per_day {
        let local = midnight + TimeDelta::minutes(step * GAP_STEP_MINUTES);
        if let Some(start) = tz.from_local_datetime(&local).earliest() {
            return start.timestamp_millis();
        }
    }

    let offset = TimeDelta::seconds(i64::from(now.offset().fix().local_minus_utc()));
    (midnight - offset).and_utc().timestamp_millis()
}

/// Number of entries for `item_id` logged since local midnight of `now`.
///
/// There is no upper bound: entries stamped after `now` still count.
pub fn count_today<Tz: TimeZone>(logs: &[LogEntry], item_id: &str, now: &DateTime<Tz>) -> u64 {
    count_since(logs, item_id, start_of_day(now))
}

/// Today's count for every item, in item order.
pub fn today_counts<Tz: TimeZone>(
    items: &[Item],
    logs: &[LogEntry],
    now: &DateTime<Tz>,
) -> Vec<ItemCount> {
    let start = start_of_day(now);
    items
        .iter()
        .map(|item| ItemCount {
            id: item.id.clone(),
            name: item.name.clone(),
            color: item.color.clone(),
            count: count_since(logs, &item.id, start),
        })
        .collect()
}

fn count_since(logs: &[LogEntry], item_id: &str, start: i64) -> u64 {
    logs.iter()
        .filter(|entry| entry.item_id == item_id && entry.timestamp >= start)
        .count() as u64
}
