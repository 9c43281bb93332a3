//! Text output formatting

use colored::Colorize;
use tanuki_core::ComposedBlob;

/// Render every blob of a match: project name, permalink, then the raw text.
pub fn format_composed(composed: &ComposedBlob) -> String {
    let mut out = String::new();
    for blob in &composed.blobs {
        out.push_str(&format!(
            "{}\n{}\n",
            composed.project.name.bold().italic(),
            composed.permalink(blob).underline()
        ));
        out.push_str(&blob.data);
        // Snippets usually end with a newline; keep the next header on its own line.
        if !blob.data.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}
