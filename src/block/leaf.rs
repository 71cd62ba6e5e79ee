//! Leaf blocks: blank lines, ATX headings, thematic breaks, fenced code and
//! indented code.

use crate::ast::{Block, Inline, InlineContent};
use crate::helpers::{expand_tabs, partition_by_spaces, strip_backslash};
use crate::source::{ScanMatch, Source};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADING_RE: Regex =
        Regex::new(r"(?m)\A( {0,3})(#{1,6})([ \t][^\n]*)?$\n?").expect("heading regex");
    static ref THEMATIC_RE: Regex =
        Regex::new(r"(?m)\A {0,3}([-_*][ \t]*){3,}$\n?").expect("thematic break regex");
    static ref FENCE_RE: Regex =
        Regex::new(r"(?m)\A( {0,3})(`{3,}|~{3,})[ \t]*([^\n]*?)[ \t]*$\n?")
            .expect("fence regex");
    static ref FENCE_CLOSE_RE: Regex =
        Regex::new(r"\A {0,3}(~+|`+)[ \t]*\n?\z").expect("fence close regex");
}

// ---------------------------------------------------------------------------
// Blank lines
// ---------------------------------------------------------------------------

pub fn match_blank_line(source: &mut Source) -> bool {
    match source.next_line() {
        Some(line) => line.trim().is_empty(),
        None => false,
    }
}

/// Consume a run of blank lines; the anchor remembers where it started so
/// list parsing can rewind over trailing blanks.
pub fn parse_blank_line(source: &mut Source) -> Option<Block> {
    if !match_blank_line(source) {
        return None;
    }
    let anchor = source.pos;
    while !source.exhausted() && match_blank_line(source) {
        source.consume();
    }
    Some(Block::BlankLine { anchor })
}

// ---------------------------------------------------------------------------
// ATX headings
// ---------------------------------------------------------------------------

pub fn match_heading(source: &mut Source) -> Option<ScanMatch> {
    source.expect_re(&HEADING_RE)
}

pub fn try_parse_heading(source: &mut Source) -> Option<Block> {
    let matched = match_heading(source)?;
    let level = matched.group(2).expect("marker group").len() as u8;
    let raw = matched.group(3).unwrap_or("");
    let text = strip_closing_sequence(raw).trim().to_string();
    source.consume();
    Some(Block::Heading {
        level,
        body: InlineContent::Raw(text),
    })
}

/// Drop a trailing run of `#` when it is separated from the content by
/// whitespace; `# foo #` and `# foo` are the same heading.
fn strip_closing_sequence(raw: &str) -> &str {
    let trimmed = raw.trim_end();
    let hashes = trimmed.chars().rev().take_while(|c| *c == '#').count();
    if hashes == 0 {
        return raw;
    }
    let cut = trimmed.len() - hashes;
    match trimmed[..cut].chars().last() {
        Some(' ') | Some('\t') => &trimmed[..cut],
        _ => raw,
    }
}

// ---------------------------------------------------------------------------
// Thematic breaks
// ---------------------------------------------------------------------------

pub fn match_thematic_break(source: &mut Source) -> Option<ScanMatch> {
    let matched = source.expect_re(&THEMATIC_RE)?;
    let mut marker = None;
    for c in matched.group(0)?.chars().filter(|c| !c.is_whitespace()) {
        match marker {
            None => marker = Some(c),
            Some(m) if m == c => {}
            Some(_) => return None,
        }
    }
    Some(matched)
}

pub fn try_parse_thematic_break(source: &mut Source) -> Option<Block> {
    match_thematic_break(source)?;
    source.consume();
    Some(Block::ThematicBreak)
}

// ---------------------------------------------------------------------------
// Fenced code
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FenceSeed {
    indent: String,
    leading: String,
    lang: Option<String>,
    extra: Option<String>,
}

pub fn match_fenced_code(source: &mut Source) -> Option<FenceSeed> {
    let matched = source.expect_re(&FENCE_RE)?;
    let indent = matched.group(1)?.to_string();
    let leading = matched.group(2)?.to_string();
    let info = matched.group(3).unwrap_or("");
    if leading.starts_with('`') && info.contains('`') {
        return None;
    }
    let (lang, _, extra) = partition_by_spaces(info);
    let lang = strip_backslash(lang);
    Some(FenceSeed {
        indent,
        leading,
        lang: if lang.is_empty() { None } else { Some(lang) },
        extra: if extra.is_empty() {
            None
        } else {
            Some(extra.to_string())
        },
    })
}

pub fn try_parse_fenced_code(source: &mut Source) -> Option<Block> {
    let seed = match_fenced_code(source)?;
    source.consume();
    let fence_char = seed.leading.chars().next().expect("fence marker");
    let mut lines: Vec<String> = Vec::new();
    while !source.exhausted() {
        let line = match source.next_line() {
            Some(line) => line,
            None => break,
        };
        source.consume();
        if let Some(caps) = FENCE_CLOSE_RE.captures(&line) {
            let run = caps.get(1).expect("fence run").as_str();
            if run.starts_with(fence_char) && run.len() >= seed.leading.len() {
                break;
            }
        }
        // Strip up to the opening fence's indentation from each body line.
        let body_line = match source.match_prefix(&seed.indent, &line) {
            Some(n) => line[n..].to_string(),
            None => line.trim_start().to_string(),
        };
        lines.push(body_line);
    }
    Some(Block::FencedCode {
        lang: seed.lang,
        extra: seed.extra,
        children: vec![Inline::RawText {
            text: lines.concat(),
            escape: false,
        }],
    })
}

// ---------------------------------------------------------------------------
// Indented code
// ---------------------------------------------------------------------------

pub fn match_code_block(source: &mut Source) -> Option<String> {
    let line = source.current_line()?;
    let prefix = source.code_block_prefix();
    let stripped = strip_code_prefix(source, &prefix, &line);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

pub fn try_parse_code_block(source: &mut Source) -> Option<Block> {
    let first = match_code_block(source)?;
    source.consume_line();
    let blank_prefix = {
        let mut prefix = source.prefix();
        prefix.push_str(" {4}");
        prefix
    };
    let mut lines = vec![first];
    source.set_anchor();
    while !source.exhausted() {
        let line = source.next_line();
        match line {
            Some(line) if line.trim().is_empty() => {
                source.consume();
                let stripped = strip_code_prefix(source, &blank_prefix, &line);
                if stripped.is_empty() {
                    lines.push("\n".to_string());
                } else {
                    lines.push(stripped);
                }
            }
            _ => {
                if let Some(next) = match_code_block(source) {
                    lines.push(next);
                    source.consume_line();
                    source.set_anchor();
                } else {
                    source.reset();
                    break;
                }
            }
        }
    }
    let mut body = lines.concat();
    body.truncate(body.trim_end_matches('\n').len());
    body.push('\n');
    Some(Block::CodeBlock {
        children: vec![Inline::RawText {
            text: body,
            escape: false,
        }],
    })
}

/// Strip a prefix from a line, re-materializing the remainder of a tab that
/// straddles the prefix boundary.
fn strip_code_prefix(source: &mut Source, prefix: &str, line: &str) -> String {
    let expanded_full = expand_tabs(line);
    let end = match source.prefix_find(prefix, &expanded_full) {
        Some(end) => end,
        None => return String::new(),
    };
    let mut upto = 0;
    for (idx, ch) in line.char_indices() {
        upto = idx + ch.len_utf8();
        let expanded = expand_tabs(&line[..upto]);
        if expanded.len() < end {
            continue;
        }
        let over = expanded.len() - end;
        if over == 0 {
            return line[upto..].to_string();
        }
        return format!("{}{}", &expanded[expanded.len() - over..], &line[upto..]);
    }
    String::new()
}
