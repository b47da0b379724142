/// Normalize extracted text: unify line endings, strip trailing whitespace
/// per line, collapse runs of blank lines to a single blank line, trim.
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n");

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;
    for line in unified.split('\n') {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
