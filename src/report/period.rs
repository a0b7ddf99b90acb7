use std::str::FromStr;

use jiff::Zoned;

const DAY: i64 = 24 * 3600;

/// Reporting window, anchored on local midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    Today,
    Yesterday,
    Week,
    Month,
    All,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown period {0:?} (expected today, yesterday, week, month or all)")]
pub struct UnknownPeriod(pub String);

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(UnknownPeriod(other.to_string())),
        }
    }
}

impl Period {
    /// Start and end epoch seconds of the window containing `now`.
    pub fn window(self, now: &Zoned) -> Result<(i64, i64), jiff::Error> {
        let midnight = now.date().to_zoned(now.time_zone().clone())?.timestamp().as_second();
        let now = now.timestamp().as_second();
        Ok(match self {
            Self::Today => (midnight, now),
            Self::Yesterday => (midnight - DAY, midnight),
            Self::Week => (midnight - 7 * DAY, now),
            Self::Month => (midnight - 30 * DAY, now),
            Self::All => (0, now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::tz::TimeZone;
    use jiff::Timestamp;

    fn noon_utc() -> Zoned {
        // 2023-11-14 12:00:00 UTC
        Timestamp::from_second(1_699_963_200).unwrap().to_zoned(TimeZone::UTC)
    }

    #[test]
    fn test_parse() {
        assert_eq!("week".parse::<Period>().unwrap(), Period::Week);
        assert!("fortnight".parse::<Period>().is_err());
    }

    #[test]
    fn test_windows() {
        let now = noon_utc();
        let midnight = 1_699_920_000;
        assert_eq!(Period::Today.window(&now).unwrap(), (midnight, 1_699_963_200));
        assert_eq!(Period::Yesterday.window(&now).unwrap(), (midnight - DAY, midnight));
        assert_eq!(Period::Month.window(&now).unwrap().0, midnight - 30 * DAY);
        assert_eq!(Period::All.window(&now).unwrap().0, 0);
    }
}
