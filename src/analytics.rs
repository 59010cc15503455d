use chrono::Datelike;
use serde::Serialize;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthBucket {
    pub month: &'static str,
    pub count: u64,
}

/// Group creation stamps into the 12 calendar-month buckets the dashboard
/// charts. Year is ignored: rows from different years in the same month
/// accumulate together. Unparseable stamps are skipped, so the bucket sum
/// equals the number of valid rows.
pub fn month_buckets<'a, I>(stamps: I) -> Vec<MonthBucket>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut buckets: Vec<MonthBucket> = MONTH_LABELS
        .iter()
        .map(|label| MonthBucket {
            month: label,
            count: 0,
        })
        .collect();
    for stamp in stamps {
        if let Some(idx) = month_index(stamp) {
            buckets[idx].count += 1;
        }
    }
    buckets
}

fn month_index(stamp: &str) -> Option<usize> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(stamp) {
        return Some(dt.month0() as usize);
    }
    // Plain dates ("2022-03-01") also occur in imported rows.
    let date_part = stamp.get(..10)?;
    chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(|d| d.month0() as usize)
}
