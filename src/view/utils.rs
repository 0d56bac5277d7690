//! Utility functions for rendering UI components

pub fn format_duration(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_renders_minutes_and_seconds() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(61_000), "1:01");
        assert_eq!(format_duration(600_000), "10:00");
    }

    #[test]
    fn format_duration_clamps_negative_input() {
        assert_eq!(format_duration(-500), "0:00");
    }

    #[test]
    fn truncate_string_adds_ellipsis_only_when_needed() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("a very long song title", 10), "a very ...");
    }
}
