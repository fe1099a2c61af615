/// Studio settings, read from the environment.
///
/// - `GYRE_TITLE`: window title
/// - `GYRE_TIME_SCALE`: animation speed multiplier (positive, finite; default 1.0)
/// - `GYRE_START`: start time as `HH:MM[:SS]` instead of the current UTC time
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    pub title: String,
    pub time_scale: f64,
    pub start_seconds: Option<f64>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            title: "gyre".to_string(),
            time_scale: 1.0,
            start_seconds: None,
        }
    }
}

impl StudioConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from a key lookup; invalid values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(title) = lookup("GYRE_TITLE").filter(|t| !t.trim().is_empty()) {
            config.title = title;
        }

        if let Some(raw) = lookup("GYRE_TIME_SCALE") {
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v > 0.0 => config.time_scale = v,
                _ => log::warn!("ignoring GYRE_TIME_SCALE={raw:?}: expected a positive number"),
            }
        }

        if let Some(raw) = lookup("GYRE_START") {
            match parse_clock_time(&raw) {
                Some(s) => config.start_seconds = Some(s),
                None => log::warn!("ignoring GYRE_START={raw:?}: expected HH:MM or HH:MM:SS"),
            }
        }

        config
    }
}

/// Parses `HH:MM` or `HH:MM:SS` into seconds since midnight.
fn parse_clock_time(raw: &str) -> Option<f64> {
    let mut parts = raw.trim().split(':');
    let h: u32 = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let s: u32 = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || h > 23 || m > 59 || s > 59 {
        return None;
    }
    Some(f64::from(h * 3_600 + m * 60 + s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> StudioConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StudioConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_without_env() {
        assert_eq!(config(&[]), StudioConfig::default());
    }

    #[test]
    fn reads_all_keys() {
        let c = config(&[
            ("GYRE_TITLE", "face"),
            ("GYRE_TIME_SCALE", "60"),
            ("GYRE_START", "08:30"),
        ]);
        assert_eq!(c.title, "face");
        assert_eq!(c.time_scale, 60.0);
        assert_eq!(c.start_seconds, Some(30_600.0));
    }

    #[test]
    fn invalid_values_fall_back() {
        let c = config(&[
            ("GYRE_TITLE", "   "),
            ("GYRE_TIME_SCALE", "-2"),
            ("GYRE_START", "25:00"),
        ]);
        assert_eq!(c, StudioConfig::default());
        assert_eq!(config(&[("GYRE_TIME_SCALE", "fast")]).time_scale, 1.0);
    }

    #[test]
    fn clock_time_formats() {
        assert_eq!(parse_clock_time("00:00"), Some(0.0));
        assert_eq!(parse_clock_time("15:30:05"), Some(55_805.0));
        assert_eq!(parse_clock_time("12"), None);
        assert_eq!(parse_clock_time("1:2:3:4"), None);
        assert_eq!(parse_clock_time("10:60"), None);
    }
}
