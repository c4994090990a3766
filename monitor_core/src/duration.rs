//! Serde helpers for durations written either as humantime strings
//! (`"10s"`, `"1m 30s"`) or as a bare number of seconds.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Text(String),
    Seconds(f64),
}

impl RawDuration {
    fn into_duration<E: serde::de::Error>(self) -> Result<Duration, E> {
        match self {
            RawDuration::Text(s) => humantime::parse_duration(&s).map_err(E::custom),
            RawDuration::Seconds(secs) if secs.is_finite() && secs >= 0.0 => {
                Duration::try_from_secs_f64(secs).map_err(E::custom)
            }
            RawDuration::Seconds(secs) => Err(E::custom(format!("invalid duration: {}", secs))),
        }
    }
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    RawDuration::deserialize(deserializer)?.into_duration()
}

pub mod option {
    use super::RawDuration;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<RawDuration>::deserialize(deserializer)?
            .map(RawDuration::into_duration)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        every: Duration,
        #[serde(with = "super::option", default)]
        timeout: Option<Duration>,
    }

    #[test]
    fn test_parse_humantime_and_seconds() {
        let h: Holder = serde_json::from_str(r#"{"every": "1m 30s", "timeout": 2}"#).unwrap();
        assert_eq!(h.every, Duration::from_secs(90));
        assert_eq!(h.timeout, Some(Duration::from_secs(2)));

        let h: Holder = serde_json::from_str(r#"{"every": 0.5}"#).unwrap();
        assert_eq!(h.every, Duration::from_millis(500));
        assert_eq!(h.timeout, None);
    }

    #[test]
    fn test_reject_negative_seconds() {
        assert!(serde_json::from_str::<Holder>(r#"{"every": -1}"#).is_err());
    }

    #[test]
    fn test_reject_out_of_range_seconds() {
        assert!(serde_json::from_str::<Holder>(r#"{"every": 1e20}"#).is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"every": 1, "timeout": 1e30}"#).is_err());
    }
}
