//! Deterministic export file names.

const MISSING_GRADE: &str = "0";
const MISSING_SUBJECT: &str = "Unknown";
const MISSING_SEMESTER: &str = "00";

/// Builds `Grade{grade}_{subject}_Semester{semester}_Questions.csv`.
///
/// Missing or empty fields fall back to `0` / `Unknown` / `00` before anything
/// other than ASCII letters and digits is stripped.
pub fn export_file_name(
    grade: Option<&str>,
    subject: Option<&str>,
    semester: Option<&str>,
) -> String {
    let grade = keep_alphanumeric(non_empty_or(grade, MISSING_GRADE));
    let subject = keep_alphanumeric(non_empty_or(subject, MISSING_SUBJECT));
    let semester = keep_alphanumeric(non_empty_or(semester, MISSING_SEMESTER));

    format!("Grade{}_{}_Semester{}_Questions.csv", grade, subject, semester)
}

fn non_empty_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}

fn keep_alphanumeric(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}
