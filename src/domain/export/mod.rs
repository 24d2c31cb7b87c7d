pub mod csv;
pub mod file_name;

pub use self::csv::{render_questions_csv, CSV_COLUMNS};
pub use file_name::export_file_name;
