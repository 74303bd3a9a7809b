//! Section markers
//!
//! A page's markdown may carve itself into named sections with paired
//! delimiters:
//!
//! ```text
//! <!-- section:intro title="Introduction" -->
//! Some content.
//! <!-- /section:intro -->
//! ```
//!
//! Content is parsed into an ordered list of section records and serialized
//! back when written; every edit (rename, reorder, content replace) mutates
//! the records and re-serializes, never patching the raw text. Leading text
//! before the first marker is an implicit "main-content" section, and a page
//! with no markers is one implicit section.

use serde::{Deserialize, Serialize};

pub const MAIN_SECTION_ID: &str = "main-content";
pub const MAIN_SECTION_TITLE: &str = "Main Content";

const START_PREFIX: &str = "<!-- section:";
const TITLE_PREFIX: &str = " title=\"";
const MARKER_SUFFIX: &str = " -->";
const END_PREFIX: &str = "<!-- /section:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    fn main(content: impl Into<String>) -> Self {
        Self::new(MAIN_SECTION_ID, MAIN_SECTION_TITLE, content)
    }
}

/// Parse page content into ordered section records.
///
/// Markerless content yields a single implicit main section. An unterminated
/// section runs to the end of the content; serialization normalizes it by
/// adding the missing end marker. Stray text between sections is appended to
/// the preceding section so no content is ever dropped.
pub fn parse_sections(content: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut rest = content;

    loop {
        let Some((before, id, title, after_start)) = next_start_marker(rest) else {
            // No more markers; remaining text belongs to the previous
            // section or the implicit main section.
            attach_loose_text(&mut sections, rest);
            break;
        };

        attach_loose_text(&mut sections, before);

        let end_marker = format!("{}{}{}", END_PREFIX, id, MARKER_SUFFIX);
        let (body, after) = match after_start.find(&end_marker) {
            Some(pos) => {
                let after = &after_start[pos + end_marker.len()..];
                (&after_start[..pos], after)
            }
            None => (after_start, ""),
        };

        sections.push(Section::new(id, title, trim_framing(body)));
        rest = after.strip_prefix('\n').unwrap_or(after);
    }

    if sections.is_empty() {
        return vec![Section::main(content.to_string())];
    }

    sections
}

/// Serialize section records back into marker-delimited text.
///
/// The implicit main section stays bare only while it is first; moved
/// elsewhere it gets markers like any other section, so the round trip
/// holds regardless of ordering. Every section body is framed by exactly
/// one newline that parsing strips back off, so content survives the
/// round trip byte for byte, trailing newlines included. A bare main
/// section with only whitespace is dropped, matching the parser.
pub fn serialize_sections(sections: &[Section]) -> String {
    let mut out = String::new();

    for (index, section) in sections.iter().enumerate() {
        if index == 0 && section.id == MAIN_SECTION_ID {
            if section.content.trim().is_empty() {
                continue;
            }
            out.push_str(&section.content);
            out.push('\n');
            continue;
        }

        out.push_str(START_PREFIX);
        out.push_str(&section.id);
        out.push_str(TITLE_PREFIX);
        out.push_str(&escape_title(&section.title));
        out.push('"');
        out.push_str(MARKER_SUFFIX);
        out.push('\n');
        out.push_str(&section.content);
        out.push('\n');
        out.push_str(END_PREFIX);
        out.push_str(&section.id);
        out.push_str(MARKER_SUFFIX);
        out.push('\n');
    }

    out
}

/// Rewrite one section's title, leaving every other section untouched.
/// Returns None when no section has the given id.
pub fn rename_section(content: &str, section_id: &str, new_title: &str) -> Option<String> {
    let mut sections = parse_sections(content);
    let section = sections.iter_mut().find(|s| s.id == section_id)?;
    section.title = new_title.to_string();
    Some(serialize_sections(&sections))
}

/// Replace one section's content. Returns None when no section has the id.
pub fn replace_section_content(
    content: &str,
    section_id: &str,
    new_content: &str,
) -> Option<String> {
    let mut sections = parse_sections(content);
    let section = sections.iter_mut().find(|s| s.id == section_id)?;
    section.content = new_content.to_string();
    Some(serialize_sections(&sections))
}

/// Re-serialize all sections in the given order. Every existing section id
/// must appear exactly once in `order`.
pub fn reorder_sections(content: &str, order: &[String]) -> anyhow::Result<String> {
    let sections = parse_sections(content);

    if order.len() != sections.len() {
        anyhow::bail!(
            "order lists {} sections, page has {}",
            order.len(),
            sections.len()
        );
    }

    let mut reordered = Vec::with_capacity(sections.len());
    for id in order {
        let section = sections
            .iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| anyhow::anyhow!("unknown section id: {}", id))?;
        reordered.push(section.clone());
    }

    Ok(serialize_sections(&reordered))
}

/// Replace markers with plain markdown headings, for export rendering.
pub fn strip_markers(content: &str) -> String {
    let sections = parse_sections(content);
    let mut out = String::new();

    for (index, section) in sections.iter().enumerate() {
        if section.id == MAIN_SECTION_ID {
            out.push_str(&section.content);
        } else {
            out.push_str("## ");
            out.push_str(&section.title);
            out.push_str("\n\n");
            out.push_str(&section.content);
        }
        if index + 1 < sections.len() {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
    }

    out
}

/// Locate the next start marker. Returns the text before it, the section id,
/// the title, and the text following the marker line.
fn next_start_marker<'a>(text: &'a str) -> Option<(&'a str, String, String, &'a str)> {
    let mut search_from = 0;

    while let Some(rel) = text[search_from..].find(START_PREFIX) {
        let start = search_from + rel;
        let after_prefix = &text[start + START_PREFIX.len()..];

        if let Some((id, title, consumed)) = parse_marker_fields(after_prefix) {
            let mut body_start = start + START_PREFIX.len() + consumed;
            if text[body_start..].starts_with('\n') {
                body_start += 1;
            }
            return Some((&text[..start], id, title, &text[body_start..]));
        }

        // Not a well-formed marker; skip past it and keep looking
        search_from = start + START_PREFIX.len();
    }

    None
}

/// Parse `ID title="Title" -->` immediately after the start prefix.
/// Returns the id, title, and the number of bytes consumed.
fn parse_marker_fields(text: &str) -> Option<(String, String, usize)> {
    let title_at = text.find(TITLE_PREFIX)?;
    let id = &text[..title_at];
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return None;
    }

    let after_title = &text[title_at + TITLE_PREFIX.len()..];
    let title_end = after_title.find('"')?;
    let title = unescape_title(&after_title[..title_end]);

    let after_quote = &after_title[title_end + 1..];
    if !after_quote.starts_with(MARKER_SUFFIX) {
        return None;
    }

    let consumed = title_at + TITLE_PREFIX.len() + title_end + 1 + MARKER_SUFFIX.len();
    Some((id.to_string(), title, consumed))
}

/// Titles live inside a quoted marker attribute, so quotes (and the
/// ampersands that would collide with the entities) are stored escaped.
fn escape_title(title: &str) -> String {
    title.replace('&', "&amp;").replace('"', "&quot;")
}

fn unescape_title(raw: &str) -> String {
    raw.replace("&quot;", "\"").replace("&amp;", "&")
}

/// Trim the framing newline a serialized section body carries before its end
/// marker, without touching interior whitespace.
fn trim_framing(body: &str) -> String {
    body.strip_suffix('\n').unwrap_or(body).to_string()
}

/// Fold loose text into the previous section, or open the implicit main
/// section when it appears before any marker.
fn attach_loose_text(sections: &mut Vec<Section>, text: &str) {
    let trimmed = text.strip_suffix('\n').unwrap_or(text);
    if trimmed.trim().is_empty() {
        return;
    }

    match sections.last_mut() {
        Some(last) => {
            if !last.content.is_empty() {
                last.content.push('\n');
            }
            last.content.push_str(trimmed);
        }
        None => sections.push(Section::main(trimmed.to_string())),
    }
}
