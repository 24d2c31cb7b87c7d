//! CSV rendering for question exports.

use crate::domain::model::Question;
use anyhow::Context;
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// Export column order.
pub const CSV_COLUMNS: [&str; 9] = [
    "question_number",
    "category",
    "difficulty_level",
    "question_text",
    "choice_1",
    "choice_2",
    "choice_3",
    "choice_4",
    "correct_choice",
];

/// Renders `questions` as CSV: a bare header line, then one fully quoted row per
/// question with embedded quotes doubled. An empty slice yields the header only.
pub fn render_questions_csv(questions: &[Question]) -> anyhow::Result<String> {
    let mut header = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header.write_record(CSV_COLUMNS)?;
    let buf = header
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV header: {}", e.error()))?;

    let mut rows = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(buf);

    for q in questions {
        let number = q.question_number.to_string();
        rows.write_record([
            number.as_str(),
            q.category.as_str(),
            q.difficulty_level.as_str(),
            q.question_text.as_str(),
            q.choice_1.as_str(),
            q.choice_2.as_str(),
            q.choice_3.as_str(),
            q.choice_4.as_str(),
            q.correct_choice.as_str(),
        ])
        .with_context(|| format!("writing question {}", q.question_number))?;
    }

    let bytes = rows
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV rows: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}
