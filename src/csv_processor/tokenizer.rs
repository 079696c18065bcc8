/// Splits one line into trimmed fields.
///
/// The quote character only toggles delimiter suppression and is never
/// copied into a field, wherever it appears. There is no escape syntax and
/// quote state does not survive the end of the line: an unbalanced quote is
/// dropped silently. A trailing field that is empty after trimming is
/// omitted, so `"a,b,"` yields two fields.
pub fn tokenize_line(line: &str, delimiter: char, quote: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        if ch == quote {
            in_quotes = !in_quotes;
        } else if ch == delimiter && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }

    let last = current.trim();
    if !last.is_empty() {
        fields.push(last.to_string());
    }

    fields
}
