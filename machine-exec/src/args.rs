//! Argument-line construction and tokenization. Pure string work, no
//! process side effects.

/// Build a single argument line: operation first, options in the order
/// given, target identifier last. Empty option strings are skipped. No
/// reordering, deduplication, or validation is applied, and nothing is
/// quoted on the caller's behalf; option values that contain spaces must
/// arrive already quoted.
pub fn build(operation: &str, options: &[&str], target: Option<&str>) -> String {
    let mut line = String::from(operation);
    for opt in options {
        if opt.is_empty() {
            continue;
        }
        line.push(' ');
        line.push_str(opt);
    }
    if let Some(target) = target {
        line.push(' ');
        line.push_str(target);
    }
    line
}

/// Tokenize an argument line into argv for spawning. Double quotes group
/// words and are stripped, so `--memory "2048"` becomes two tokens with
/// the quotes gone. Returns `None` when the line cannot be tokenized
/// (unterminated quote).
pub fn split(line: &str) -> Option<Vec<String>> {
    shlex::split(line)
}
