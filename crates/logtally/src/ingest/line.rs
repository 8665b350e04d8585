//! Line — split a whitespace-delimited log line into its fields.

/// The fields of a well-formed line: a leading token (usually a timestamp),
/// the service, the severity, and whatever text follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLine<'a> {
    pub leading: &'a str,
    pub service: &'a str,
    pub severity: &'a str,
    pub message: &'a str,
}

/// Parse a line into at most four fields. Lines with fewer than three
/// whitespace-separated tokens yield `None` and are ignored by the caller.
pub fn parse_line(line: &str) -> Option<LogLine<'_>> {
    let (leading, rest) = next_token(line)?;
    let (service, rest) = next_token(rest)?;
    let (severity, rest) = next_token(rest)?;
    Some(LogLine {
        leading,
        service,
        severity,
        message: rest.trim(),
    })
}

/// Returns the first token of `s` and the unconsumed remainder.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], &s[end..])),
        None => Some((s, "")),
    }
}
