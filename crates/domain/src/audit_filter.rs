use chrono::{DateTime, SecondsFormat, Utc};

/// Returns the logging filter matching entries authenticated as `principal`.
#[must_use]
pub fn principal_filter(principal: &str) -> String {
    format!(
        "protoPayload.authenticationInfo.principalEmail=\"{}\"",
        escape(principal)
    )
}

/// Inclusive time window of a grant's captured activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
}

impl ActivityWindow {
    /// Creates a window closed at `end`.
    #[must_use]
    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Creates a window without an upper bound.
    #[must_use]
    pub fn open_ended(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    /// Returns whether `timestamp` falls inside the window.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && self.end.is_none_or(|end| timestamp <= end)
    }

    /// Returns the logging filter for `principal` within this window.
    #[must_use]
    pub fn filter_for(&self, principal: &str) -> String {
        let mut filter = format!(
            "{} AND timestamp>=\"{}\"",
            principal_filter(principal),
            self.start.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        );
        if let Some(end) = self.end {
            filter.push_str(&format!(
                " AND timestamp<=\"{}\"",
                end.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ));
        }

        filter
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{ActivityWindow, principal_filter};

    #[test]
    fn principal_filter_quotes_the_principal() {
        assert_eq!(
            principal_filter("alice@example.com"),
            "protoPayload.authenticationInfo.principalEmail=\"alice@example.com\""
        );
    }

    #[test]
    fn closed_window_bounds_both_ends() {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        let end = Utc
            .with_ymd_and_hms(2024, 1, 1, 1, 0, 0)
            .single()
            .unwrap_or_default();
        let window = ActivityWindow::closed(start, end);

        assert_eq!(
            window.filter_for("alice@example.com"),
            "protoPayload.authenticationInfo.principalEmail=\"alice@example.com\" \
             AND timestamp>=\"2024-01-01T00:00:00Z\" AND timestamp<=\"2024-01-01T01:00:00Z\""
        );
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(end + chrono::Duration::seconds(1)));
    }

    #[test]
    fn open_window_omits_upper_bound() {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        let filter = ActivityWindow::open_ended(start).filter_for("alice@example.com");
        assert!(filter.ends_with("timestamp>=\"2024-01-01T00:00:00Z\""));
        assert!(!filter.contains("timestamp<="));
    }
}
