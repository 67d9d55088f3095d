use crate::linearizer::VisibleMessage;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

const TITLE_RULE: &str = "==============================";
const MESSAGE_RULE: &str = "--------------------";

/// Printed in place of a conversation that has no title.
pub const UNTITLED: &str = "None";

/// Write the plain-text transcript.
///
/// ```text
/// Title: <title>
/// ==============================
///
/// [USER]:
/// <text>
/// --------------------
/// ```
pub fn write_transcript<W: Write>(
    writer: &mut W,
    title: Option<&str>,
    messages: &[VisibleMessage],
) -> std::io::Result<()> {
    writeln!(writer, "Title: {}", title.unwrap_or(UNTITLED))?;
    writeln!(writer, "{}", TITLE_RULE)?;

    for msg in messages {
        writeln!(writer)?;
        writeln!(writer, "[{}]:", msg.role.as_str().to_uppercase())?;
        writeln!(writer, "{}", msg.text)?;
        writeln!(writer, "{}", MESSAGE_RULE)?;
    }

    Ok(())
}

/// `chat.json` becomes `chat.txt`, next to the input or inside `output_dir`.
pub fn output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let sibling = input.with_extension("txt");
    match output_dir {
        Some(dir) => dir.join(
            sibling
                .file_name()
                .unwrap_or_else(|| OsStr::new("conversation.txt")),
        ),
        None => sibling,
    }
}
