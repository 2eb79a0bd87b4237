//! Serde helpers shared by the configuration domains

use std::time::Duration;

/// Parse `90`, `90s`, `1500ms`, `2m` or `1h` into a duration
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let split = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value: u64 = number.parse().ok()?;

    match unit.trim() {
        "" | "s" => Some(Duration::from_secs(value)),
        "ms" => Some(Duration::from_millis(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        "h" => value.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}

/// Durations as whole seconds, or `"<n>ms"` when sub-second. Input may also
/// be any string accepted by [`parse_duration`].
pub mod serde_duration {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Seconds(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match RawDuration::deserialize(deserializer)? {
            RawDuration::Seconds(seconds) => Ok(Duration::from_secs(seconds)),
            RawDuration::Text(text) => super::parse_duration(&text)
                .ok_or_else(|| de::Error::custom(format!("invalid duration '{}'", text))),
        }
    }
}

pub fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("60"), Some(Duration::from_secs(60)));
        assert_eq!(parse_duration(" 90s "), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("1500ms"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("5d"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Budget {
        #[serde(with = "serde_duration")]
        timeout: Duration,
    }

    #[test]
    fn test_sub_second_durations_survive_yaml() {
        let yaml = serde_yaml::to_string(&Budget { timeout: Duration::from_millis(1500) }).unwrap();
        assert_eq!(yaml.trim(), "timeout: 1500ms");

        let whole: Budget = serde_yaml::from_str("timeout: 45").unwrap();
        assert_eq!(whole.timeout, Duration::from_secs(45));
    }
}
