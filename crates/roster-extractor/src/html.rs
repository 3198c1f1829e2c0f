//! Lightweight HTML handling: table cells and flattened text.
//!
//! Email bodies are small and loosely formed, so this is a tag scanner rather
//! than a DOM parser. Script and style content is dropped, common entities are
//! decoded, and `<table>` rows become ` | `-joined lines.

use once_cell::sync::Lazy;
use regex::Regex;

static TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").unwrap());
static ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)(?:</tr\s*>|$)").unwrap());
static CELL_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<t[dh]\b[^>]*>").unwrap());
static CELL_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</t[dh]\s*>").unwrap());
static SCRIPT_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap());
static BREAK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(br|/p|/div|/li|/h[1-6]|/tr)\b[^>]*>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(#x?[0-9a-fA-F]+|[a-zA-Z]+);").unwrap());
static INLINE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

/// One HTML table as rows of cell text
pub type HtmlTable = Vec<Vec<String>>;

/// Every `<table>` in `html`, each as rows of trimmed cell text.
///
/// Rows without cells are skipped; a table with no rows is omitted.
pub fn html_tables(html: &str) -> Vec<HtmlTable> {
    TABLE
        .captures_iter(html)
        .filter_map(|table| {
            let body = table.get(1)?.as_str();
            let rows: HtmlTable = ROW
                .captures_iter(body)
                .filter_map(|row| {
                    let cells = row_cells(row.get(1)?.as_str());
                    (!cells.is_empty()).then_some(cells)
                })
                .collect();
            (!rows.is_empty()).then_some(rows)
        })
        .collect()
}

/// Flatten an HTML body to newline-delimited text with tables as ` | ` rows
pub fn html_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE.replace_all(html, "");

    let mut flattened = String::with_capacity(without_scripts.len());
    let mut last = 0;
    for table in TABLE.captures_iter(&without_scripts) {
        let Some(whole) = table.get(0) else { continue };
        flattened.push_str(&without_scripts[last..whole.start()]);
        flattened.push('\n');
        for row in html_tables(whole.as_str()).into_iter().flatten() {
            flattened.push_str(&row.join(" | "));
            flattened.push('\n');
        }
        last = whole.end();
    }
    flattened.push_str(&without_scripts[last..]);

    let with_breaks = BREAK_TAG.replace_all(&flattened, "\n");
    let stripped = TAG.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);

    decoded
        .lines()
        .map(|line| INLINE_SPACE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode named and numeric character references; unknown names are kept
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ if name.starts_with("#x") || name.starts_with("#X") => {
                    u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
                }
                _ if name.starts_with('#') => name[1..].parse::<u32>().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// Cell text of one row; a cell ends at its close tag or the next cell
fn row_cells(row: &str) -> Vec<String> {
    let opens: Vec<(usize, usize)> = CELL_OPEN.find_iter(row).map(|m| (m.start(), m.end())).collect();
    opens
        .iter()
        .enumerate()
        .map(|(i, &(_, content_start))| {
            let limit = opens.get(i + 1).map_or(row.len(), |&(next, _)| next);
            let content = &row[content_start..limit];
            let content = CELL_CLOSE.find(content).map_or(content, |close| &content[..close.start()]);
            cell_text(content)
        })
        .collect()
}

fn cell_text(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<html><body>
        <p>Please add the provider below.</p>
        <table border="1">
          <tr><th>Provider Name</th><th>NPI</th></tr>
          <tr><td><b>John Smith</b></td><td>1234567893</td></tr>
        </table>
        <script>var x = "<td>no</td>";</script>
        <p>Thanks &amp; regards</p>
    </body></html>"#;

    #[test]
    fn test_html_tables() {
        let tables = html_tables(HTML);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0][0], vec!["Provider Name", "NPI"]);
        assert_eq!(tables[0][1], vec!["John Smith", "1234567893"]);
    }

    #[test]
    fn test_unclosed_cells() {
        let tables = html_tables("<table><tr><td>NPI<td>1234567893</table>");
        assert_eq!(tables[0][0], vec!["NPI", "1234567893"]);
    }

    #[test]
    fn test_html_to_text_flattens_rows() {
        let text = html_to_text(HTML);
        assert_eq!(
            text,
            "Please add the provider below.\nProvider Name | NPI\nJohn Smith | 1234567893\nThanks & regards"
        );
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("A&amp;B &#39;x&#x27; &bogus;"), "A&B 'x' &bogus;");
    }
}
