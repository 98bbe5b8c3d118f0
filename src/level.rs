use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::Error;

/// Syslog severities, ordered by importance.
///
/// A sink configured with a minimum level `L` receives every record whose level is `>= L`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    Debug,
    #[default]
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Level {
    /// All levels, least important first.
    pub const ALL: [Level; 8] = [
        Level::Debug,
        Level::Info,
        Level::Notice,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Alert,
        Level::Emergency,
    ];

    /// Syslog name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "crit",
            Self::Alert => "alert",
            Self::Emergency => "emerg",
        }
    }

    /// Levels that carry a stack trace and correlation id.
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Debug | Self::Error | Self::Critical)
    }

    /// `EnvFilter` directive admitting this level and everything more important.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info | Self::Notice => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical | Self::Alert | Self::Emergency => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "notice" => Ok(Self::Notice),
            "warning" | "warn" => Ok(Self::Warning),
            "error" | "err" => Ok(Self::Error),
            "critical" | "crit" => Ok(Self::Critical),
            "alert" => Ok(Self::Alert),
            "emergency" | "emerg" => Ok(Self::Emergency),
            other => Err(Error::Config(format!("unknown log level: {}", other))),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Alert < Level::Emergency);
        let mut sorted = Level::ALL;
        sorted.sort();
        assert_eq!(sorted, Level::ALL);
    }

    #[test]
    fn test_level_parse_aliases() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("err".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("crit".parse::<Level>().unwrap(), Level::Critical);
        assert_eq!("emerg".parse::<Level>().unwrap(), Level::Emergency);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_display_round_trips() {
        for level in Level::ALL {
            assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn test_diagnostic_levels() {
        let diagnostic: Vec<_> = Level::ALL.into_iter().filter(|l| l.is_diagnostic()).collect();
        assert_eq!(diagnostic, vec![Level::Debug, Level::Error, Level::Critical]);
    }

    #[test]
    fn test_filter_mapping() {
        assert_eq!(Level::Notice.as_filter(), "info");
        assert_eq!(Level::Emergency.as_filter(), "error");
        assert_eq!(Level::Warning.as_filter(), "warn");
        assert_eq!(Level::Debug.as_filter(), "debug");
    }

    #[test]
    fn test_level_deserialize() {
        let level: Level = serde_yaml::from_str("crit").unwrap();
        assert_eq!(level, Level::Critical);
        assert!(serde_yaml::from_str::<Level>("loud").is_err());
    }
}
