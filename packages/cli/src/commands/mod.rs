pub mod apply;
pub mod init;
pub mod paste;

pub use apply::{apply, ApplyArgs};
pub use init::{init, InitArgs};
pub use paste::{paste, PasteArgs};

use colored::Colorize;
use tabula_model::{InsertValue, Line};

/// Print the document's line view, one line per row of output
pub(crate) fn print_lines(lines: &[Line]) {
    println!("{}", "Lines".bright_blue().bold());
    for line in lines {
        let content = match &line.insert {
            InsertValue::Text(text) => format!("{:?}", text),
            InsertValue::Embed(_) => "<column>".to_string(),
        };
        let formats = line
            .attributes
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ");
        println!("  {:>5} {} {}", line.id.to_string(), content, formats.dimmed());
    }
}
