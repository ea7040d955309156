use std::cmp::Ordering;

/// Maximum number of stars shown for a rating
const MAX_STARS: usize = 5;

/// Format minutes of play time: "45m", "1h 5m", "2h"
pub fn format_play_time(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    let hours = minutes / 60;
    let remaining = minutes % 60;
    if remaining > 0 {
        format!("{}h {}m", hours, remaining)
    } else {
        format!("{}h", hours)
    }
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    // Try to parse ISO format and convert to readable
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%B %-d, %Y").to_string()
    } else if let Some(d) = date
        .get(..10)
        .and_then(|prefix| chrono::NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        d.format("%B %-d, %Y").to_string()
    } else {
        date.to_string()
    }
}

/// Render a 0-5 rating as filled and empty stars
pub fn star_bar(rating: f64) -> String {
    let filled = (rating.round().max(0.0) as usize).min(MAX_STARS);
    format!("{}{}", "★".repeat(filled), "☆".repeat(MAX_STARS - filled))
}

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Case-insensitive substring test
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive ordering without allocating
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Treat blank strings as absent
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_play_time() {
        assert_eq!(format_play_time(0), "0m");
        assert_eq!(format_play_time(45), "45m");
        assert_eq!(format_play_time(60), "1h");
        assert_eq!(format_play_time(65), "1h 5m");
        assert_eq!(format_play_time(120), "2h");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-01T10:00:00Z"), "March 1, 2024");
        assert_eq!(format_date("2024-12-25T00:00:00.000Z"), "December 25, 2024");
        assert_eq!(format_date("2023-07-04"), "July 4, 2023");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_star_bar() {
        assert_eq!(star_bar(0.0), "☆☆☆☆☆");
        assert_eq!(star_bar(3.6), "★★★★☆");
        assert_eq!(star_bar(5.0), "★★★★★");
        assert_eq!(star_bar(9.0), "★★★★★");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Pokémon Légendes", 8), "Pokém...");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Team Cherry", "cherry"));
        assert!(contains_ignore_case("Team Cherry", "TEAM"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("Team Cherry", "nintendo"));
    }

    #[test]
    fn test_cmp_ignore_case() {
        assert_eq!(cmp_ignore_case("apple", "Banana"), Ordering::Less);
        assert_eq!(cmp_ignore_case("ZELDA", "zelda"), Ordering::Equal);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" x "), Some("x".to_string()));
    }
}
