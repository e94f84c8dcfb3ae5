use chrono::NaiveDateTime;

/// Форматирует число с разделителями тысяч (точками)
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Converts an RFID reader timestamp `DD/MM/YYYY HH:MM:SS` to `YYYY-MM-DD HH:MM:SS`.
/// Returns `None` if the timestamp is not in that form or is not a real date.
/// Overflowing days such as `31/02/2024` are not rolled into the next month,
/// they are shown as invalid.
pub fn format_movement_time(raw: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(raw.trim(), "%d/%m/%Y %H:%M:%S")
        .ok()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}
