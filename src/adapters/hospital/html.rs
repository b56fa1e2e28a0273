//! Tolerant HTML scanning
//!
//! Hospital pages are legacy markup: unclosed cells, mixed case tags, tables
//! used for layout. The scanner works on tag blocks with case-insensitive
//! patterns and never builds a DOM. Nested tables are not supported; the
//! pages this crate reads do not nest the tables it cares about.

use crate::domain::{QueueWatchError, Result};
use regex::Regex;

/// An anchor with its raw href and visible text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// Compiled patterns for block-level scanning
#[derive(Debug, Clone)]
pub struct HtmlScanner {
    anchor: Regex,
    href: Regex,
    class: Regex,
    table: Regex,
    row: Regex,
    cell: Regex,
    open_tag: Regex,
    line_break: Regex,
    tag: Regex,
    numeric_entity: Regex,
    whitespace: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| QueueWatchError::Configuration(format!("Invalid pattern {pattern}: {e}")))
}

impl HtmlScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            anchor: compile(r"(?is)<a\b([^>]*)>(.*?)</a\s*>")?,
            href: compile(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)?,
            class: compile(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)?,
            table: compile(r"(?is)<table\b([^>]*)>(.*?)</table\s*>")?,
            row: compile(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>")?,
            cell: compile(r"(?is)<(td|th)\b[^>]*>(.*?)</(?:td|th)\s*>")?,
            open_tag: compile(r"(?i)<([a-z][a-z0-9]*)\b([^>]*)>")?,
            line_break: compile(r"(?i)<br\s*/?>")?,
            tag: compile(r"(?s)<[^>]*>")?,
            numeric_entity: compile(r"&#(x?[0-9A-Fa-f]+);")?,
            whitespace: compile(r"\s+")?,
        })
    }

    /// Every anchor with an href
    pub fn links(&self, html: &str) -> Vec<Link> {
        self.anchor
            .captures_iter(html)
            .filter_map(|caps| {
                let href = self.attribute(&self.href, &caps[1])?;
                Some(Link {
                    href: decode_entities(&href),
                    text: self.text(&caps[2]),
                })
            })
            .collect()
    }

    /// Inner HTML of every `<tr>`
    pub fn rows<'a>(&self, html: &'a str) -> Vec<&'a str> {
        self.row
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Inner HTML of every `<td>` and `<th>` in a row
    pub fn cells<'a>(&self, row: &'a str) -> Vec<&'a str> {
        self.cell
            .captures_iter(row)
            .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
            .collect()
    }

    /// Inner HTML of the `<td>` cells in a row, header cells excluded
    pub fn data_cells<'a>(&self, row: &'a str) -> Vec<&'a str> {
        self.cell
            .captures_iter(row)
            .filter(|caps| caps[1].eq_ignore_ascii_case("td"))
            .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
            .collect()
    }

    /// Inner HTML of tables whose class attribute contains any of `classes`
    pub fn tables_with_class<'a>(&self, html: &'a str, classes: &[&str]) -> Vec<&'a str> {
        self.table
            .captures_iter(html)
            .filter(|caps| self.has_class(&caps[1], classes))
            .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
            .collect()
    }

    /// Inner HTML of elements whose class attribute contains any of `classes`
    ///
    /// The content runs to the first closing tag of the same name, which is
    /// enough for the short result fragments this is used on.
    pub fn elements_with_class<'a>(&self, html: &'a str, classes: &[&str]) -> Vec<&'a str> {
        let lowered = html.to_ascii_lowercase();
        self.open_tag
            .captures_iter(html)
            .filter(|caps| self.has_class(&caps[2], classes))
            .filter_map(|caps| {
                let start = caps.get(0)?.end();
                let close = format!("</{}", caps[1].to_ascii_lowercase());
                let end = lowered[start..].find(&close)? + start;
                Some(&html[start..end])
            })
            .collect()
    }

    /// Visible text: tags removed, entities decoded, whitespace collapsed
    pub fn text(&self, fragment: &str) -> String {
        let spaced = self.line_break.replace_all(fragment, " ");
        let stripped = self.tag.replace_all(&spaced, " ");
        let decoded = self.decode_numeric(&decode_entities(&stripped));
        self.whitespace.replace_all(&decoded, " ").trim().to_string()
    }

    fn has_class(&self, attributes: &str, classes: &[&str]) -> bool {
        self.attribute(&self.class, attributes)
            .map(|value| {
                let value = value.to_lowercase();
                classes.iter().any(|c| value.contains(c))
            })
            .unwrap_or(false)
    }

    fn attribute(&self, pattern: &Regex, attributes: &str) -> Option<String> {
        let caps = pattern.captures(attributes)?;
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string())
    }

    fn decode_numeric(&self, text: &str) -> String {
        self.numeric_entity
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let raw = &caps[1];
                let code = match raw.strip_prefix('x') {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => raw.parse::<u32>().ok(),
                };
                code.and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> HtmlScanner {
        HtmlScanner::new().unwrap()
    }

    #[test]
    fn test_links_with_mixed_quoting() {
        let html = r#"<A HREF="a.php?x=1&amp;y=2">First</A> <a href='b.php'>Se<b>cond</b></a> <a href=c.php>Third</a>"#;
        let links = scanner().links(html);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].href, "a.php?x=1&y=2");
        assert_eq!(links[1].text, "Se cond");
        assert_eq!(links[2].href, "c.php");
    }

    #[test]
    fn test_rows_and_cells() {
        let html = "<table><tr><th>時段</th><td>A</td></tr><tr><td> 1 </td><td>看診中</td></tr></table>";
        let s = scanner();
        let rows = s.rows(html);
        assert_eq!(rows.len(), 2);
        assert_eq!(s.cells(rows[0]).len(), 2);
        assert_eq!(s.data_cells(rows[0]).len(), 1);
        let cells: Vec<String> = s.cells(rows[1]).iter().map(|c| s.text(c)).collect();
        assert_eq!(cells, vec!["1", "看診中"]);
    }

    #[test]
    fn test_tables_with_class() {
        let html = r#"<table class="layout"><tr><td>x</td></tr></table>
            <table class="table regtable"><tr><td>1</td></tr></table>"#;
        let tables = scanner().tables_with_class(html, &["regtable", "resp-table"]);
        assert_eq!(tables.len(), 1);
        assert!(tables[0].contains("<td>1</td>"));
    }

    #[test]
    fn test_text_decodes_entities_and_breaks() {
        let s = scanner();
        assert_eq!(s.text("A&nbsp;&amp;<br/>B&#30149;"), "A & B病");
    }

    #[test]
    fn test_elements_with_class() {
        let html = r#"<div class="box"><span class="current-number">目前 12</span></div>"#;
        let found = scanner().elements_with_class(html, &["current"]);
        assert_eq!(found, vec!["目前 12"]);
    }
}
