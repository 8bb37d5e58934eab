//! Pro tier plans and expiry arithmetic.

use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, Result};

/// Plan lengths that can be bought, in months.
pub const PLAN_MONTHS: [u32; 3] = [1, 3, 12];

/// A "month" of Pro is a flat 30 days.
pub const DAYS_PER_MONTH: i64 = 30;

/// Price of a plan in VND.
pub fn plan_amount(months: u32, monthly_price: i64) -> Result<i64> {
    if !PLAN_MONTHS.contains(&months) {
        return Err(AppError::validation(format!(
            "unknown plan: {months} months (choose one of {PLAN_MONTHS:?})"
        )));
    }
    Ok(monthly_price * i64::from(months))
}

/// New expiry after buying `months`: time still left on an active
/// subscription is kept, a lapsed one restarts from `now`.
pub fn extend_expiry(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    months: u32,
) -> DateTime<Utc> {
    let start = match current {
        Some(expiry) if expiry > now => expiry,
        _ => now,
    };
    start + Duration::days(DAYS_PER_MONTH * i64::from(months))
}
