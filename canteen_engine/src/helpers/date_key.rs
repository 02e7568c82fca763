use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};

/// India Standard Time, UTC+05:30
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// The fixed UTC offset that canteens operate in. Token sequences roll over at local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingTimeZone(FixedOffset);

impl OperatingTimeZone {
    /// Returns `None` if the offset is a day or more away from UTC.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self)
    }

    pub fn offset(&self) -> FixedOffset {
        self.0
    }
}

impl Default for OperatingTimeZone {
    fn default() -> Self {
        Self::from_offset_minutes(DEFAULT_UTC_OFFSET_MINUTES).unwrap_or_else(|| Self(Utc.fix()))
    }
}

/// Formats the local calendar date of `at` as `YYYY-M-D`, without zero padding.
pub fn date_key_for(at: DateTime<Utc>, tz: OperatingTimeZone) -> String {
    let local = at.with_timezone(&tz.offset());
    format!("{}-{}-{}", local.year(), local.month(), local.day())
}

/// The date key for the current wall-clock time.
pub fn date_key(tz: OperatingTimeZone) -> String {
    date_key_for(Utc::now(), tz)
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn keys_are_not_zero_padded() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).unwrap();
        assert_eq!(date_key_for(at, OperatingTimeZone::default()), "2024-6-1");
        let at = Utc.with_ymd_and_hms(2024, 11, 23, 4, 0, 0).unwrap();
        assert_eq!(date_key_for(at, OperatingTimeZone::default()), "2024-11-23");
    }

    #[test]
    fn keys_roll_over_at_local_midnight() {
        let ist = OperatingTimeZone::default();
        let utc = OperatingTimeZone::from_offset_minutes(0).unwrap();
        // 18:29 UTC is 23:59 IST; 18:30 UTC is midnight IST
        let before = Utc.with_ymd_and_hms(2024, 5, 31, 18, 29, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 5, 31, 18, 30, 0).unwrap();
        assert_eq!(date_key_for(before, ist), "2024-5-31");
        assert_eq!(date_key_for(after, ist), "2024-6-1");
        assert_eq!(date_key_for(after, utc), "2024-5-31");
    }

    #[test]
    fn invalid_offsets() {
        assert!(OperatingTimeZone::from_offset_minutes(24 * 60).is_none());
        assert!(OperatingTimeZone::from_offset_minutes(i32::MAX).is_none());
        assert!(OperatingTimeZone::from_offset_minutes(-300).is_some());
    }
}
