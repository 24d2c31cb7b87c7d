//! Grade → difficulty code table handed to the question generation worker.

/// Code used for grades outside 3–12 and for grades that cannot be parsed.
pub const DEFAULT_DIFFICULTY_CODE: &str = "01";

/// Maps a school grade to its two-digit difficulty code.
///
/// 8/9 share `"06"` and 10/11 share `"07"`.
pub fn difficulty_code(grade: i64) -> &'static str {
    match grade {
        3 => "01",
        4 => "02",
        5 => "03",
        6 => "04",
        7 => "05",
        8 | 9 => "06",
        10 | 11 => "07",
        12 => "08",
        _ => DEFAULT_DIFFICULTY_CODE,
    }
}

/// Difficulty code for a stored (free-text) grade.
pub fn difficulty_code_for(grade: Option<&str>) -> &'static str {
    grade
        .and_then(parse_grade)
        .map(difficulty_code)
        .unwrap_or(DEFAULT_DIFFICULTY_CODE)
}

/// Reads the leading integer of a grade string (`"10"`, `" 7th"`, `"-1"`).
///
/// Returns `None` when the text does not start with digits after optional
/// whitespace and sign.
pub fn parse_grade(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let value = digits.parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_grades_map_to_codes() {
        assert_eq!(difficulty_code(3), "01");
        assert_eq!(difficulty_code(4), "02");
        assert_eq!(difficulty_code(5), "03");
        assert_eq!(difficulty_code(6), "04");
        assert_eq!(difficulty_code(7), "05");
        assert_eq!(difficulty_code(8), "06");
        assert_eq!(difficulty_code(9), "06");
        assert_eq!(difficulty_code(10), "07");
        assert_eq!(difficulty_code(11), "07");
        assert_eq!(difficulty_code(12), "08");
    }

    #[test]
    fn out_of_range_grades_default() {
        assert_eq!(difficulty_code(999), "01");
        assert_eq!(difficulty_code(2), "01");
        assert_eq!(difficulty_code(0), "01");
        assert_eq!(difficulty_code(-4), "01");
    }

    #[test]
    fn grade_text_is_parsed_leniently() {
        assert_eq!(parse_grade("12"), Some(12));
        assert_eq!(parse_grade("  9th"), Some(9));
        assert_eq!(parse_grade("+4"), Some(4));
        assert_eq!(parse_grade("-2"), Some(-2));
        assert_eq!(parse_grade("Grade 3"), None);
        assert_eq!(parse_grade(""), None);
    }

    #[test]
    fn stored_grades_resolve_to_codes() {
        assert_eq!(difficulty_code_for(Some("11")), "07");
        assert_eq!(difficulty_code_for(Some("8")), "06");
        assert_eq!(difficulty_code_for(Some("unknown")), "01");
        assert_eq!(difficulty_code_for(None), "01");
    }
}
