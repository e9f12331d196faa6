use time::{Date, Month, OffsetDateTime};

use crate::PkiError;

/// Calendar month arithmetic. The day of month is clamped to the length of
/// the target month, so Jan 31 + 1 month lands on Feb 28/29.
pub fn add_months(at: OffsetDateTime, months: u32) -> Result<OffsetDateTime, PkiError> {
    let months = i32::try_from(months)
        .map_err(|_| PkiError::InvalidValidity(format!("{months} months is out of range")))?;
    let index = at.year() * 12 + i32::from(u8::from(at.month())) - 1 + months;
    let year = index.div_euclid(12);
    let month_number = u8::try_from(index.rem_euclid(12) + 1)
        .map_err(|_| PkiError::InvalidValidity(format!("month index {index} out of range")))?;
    let month = Month::try_from(month_number)
        .map_err(|error| PkiError::InvalidValidity(error.to_string()))?;
    let day = at.day().min(time::util::days_in_year_month(year, month));
    let date = Date::from_calendar_date(year, month, day)
        .map_err(|error| PkiError::InvalidValidity(error.to_string()))?;
    Ok(at.replace_date(date))
}
