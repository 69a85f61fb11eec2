use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's calendar date in `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// # Errors
/// Returns [Error::InvalidTimezone] if `canonical_timezone` is not a known
/// canonical timezone name.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    let Some(offset) = get_local_offset(canonical_timezone) else {
        tracing::error!("Invalid timezone {canonical_timezone}");
        return Err(Error::InvalidTimezone(canonical_timezone.to_owned()));
    };

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::Error;

    use super::local_today;

    #[test]
    fn utc_today_is_within_a_day_of_system_date() {
        let today = local_today("Etc/UTC").expect("UTC should always resolve");
        let system_today = OffsetDateTime::now_utc().date();

        assert!((today - system_today).whole_days().abs() <= 1);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let result = local_today("Middle/Earth");

        assert_eq!(result, Err(Error::InvalidTimezone("Middle/Earth".to_owned())));
    }
}
