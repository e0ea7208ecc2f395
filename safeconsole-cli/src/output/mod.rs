//! Output formatting for CLI.

mod json;
mod text;

pub use json::{ClassifyOutput, JsonFormatter, RequestOutput, RequestReport, UsageOutput};
pub use text::TextFormatter;
