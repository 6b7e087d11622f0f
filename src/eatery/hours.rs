use std::fmt;
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;


/// Opening hours of an eatery
/// Text forms: `"24/7"` or `"HH:MM-HH:MM"`, a close time before the open
/// time wraps past midnight
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Hours {
    #[default]
    AlwaysOpen,
    Interval { open: NaiveTime, close: NaiveTime },
    /// Text that could not be parsed, kept for display and treated as open
    Unrecognized(String),
}

impl Hours {

    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("24/7") {
            return Hours::AlwaysOpen;
        }

        let Some((open, close)) = text.split_once('-') else {
            return Hours::Unrecognized(text.to_string());
        };
        match (parse_time(open), parse_time(close)) {
            (Some(open), Some(close)) => Hours::Interval { open, close },
            _ => Hours::Unrecognized(text.to_string()),
        }
    }

    /// Inclusive at both ends, unparseable hours count as open
    pub fn is_open(&self, at: NaiveTime) -> bool {
        match self {
            Hours::AlwaysOpen | Hours::Unrecognized(_) => true,
            Hours::Interval { open, close } if close < open => at >= *open || at <= *close,
            Hours::Interval { open, close } => *open <= at && at <= *close,
        }
    }
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").ok()
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hours::AlwaysOpen => write!(f, "24/7"),
            Hours::Interval { open, close } => write!(f, "{}-{}", open.format("%H:%M"), close.format("%H:%M")),
            Hours::Unrecognized(text) => write!(f, "{text}"),
        }
    }
}

impl Serialize for Hours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // null counts as no schedule, other non-text values are kept but never close
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None => Hours::AlwaysOpen,
            Some(Value::String(text)) => Hours::parse(&text),
            Some(other) => Hours::Unrecognized(other.to_string()),
        })
    }
}
