//! Paragraphs: the universal fallback, including lazy continuation and the
//! conversion into setext headings.

use crate::ast::{Block, InlineContent};
use crate::block::{container, Parser};
use crate::source::{Frame, FrameKind, Source};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PARAGRAPH_RE: Regex = Regex::new(r"(?m)\A[^\n]+$\n?").expect("paragraph regex");
    static ref SETEXT_RE: Regex =
        Regex::new(r"\A {0,3}(=+|-+)[ \t]*\n?\z").expect("setext regex");
}

pub fn match_paragraph(source: &mut Source) -> bool {
    source.expect_re(&PARAGRAPH_RE).is_some()
}

fn is_setext_underline(line: &str) -> bool {
    SETEXT_RE.is_match(line)
}

/// Whether the current line terminates an open paragraph. With `lazy` set,
/// the check runs under a reduced container stack for lazy continuation.
pub fn break_paragraph(parser: &Parser, source: &mut Source, lazy: bool) -> bool {
    if parser.kind_matches("quote", source)
        || parser.kind_matches("heading", source)
        || parser.kind_matches("blank_line", source)
        || parser.kind_matches("fenced_code", source)
    {
        return true;
    }
    if lazy
        && matches!(source.state(), FrameKind::List(_))
        && container::match_list_item(source).is_some()
    {
        return true;
    }
    if container::match_list(source).is_some() {
        if let Some(line) = source.next_line() {
            let trimmed = line.trim_end().to_string();
            let (_, bullet, _, tail) = container::parse_leading(&trimmed, 0);
            // Only a bullet or a `1.`-family marker with content may
            // interrupt a paragraph.
            let starter = matches!(bullet.as_str(), "1." | "1)" | "*" | "-" | "+");
            if lazy || (starter && !tail.is_empty()) {
                return true;
            }
        }
    }
    if let Some((html_type, _)) = crate::block::html::match_html_block(source) {
        if html_type != 7 {
            return true;
        }
    }
    if crate::block::leaf::match_thematic_break(source).is_some() {
        if !lazy {
            if let Some(line) = source.next_line() {
                if is_setext_underline(&line) {
                    return false;
                }
            }
        }
        return true;
    }
    false
}

pub fn try_parse(parser: &Parser, source: &mut Source) -> Option<Block> {
    if !match_paragraph(source) {
        return None;
    }
    let mut lines = vec![source.next_line()?];
    source.consume();
    let mut end_parse = false;
    while !source.exhausted() && !end_parse {
        if break_paragraph(parser, source, false) {
            break;
        }
        let line = source.next_line().filter(|l| !l.is_empty());
        match line {
            Some(line) => {
                lines.push(line.clone());
                source.consume();
                if is_setext_underline(&line) {
                    let underline = lines.pop().expect("underline just pushed");
                    let level = if underline.trim().starts_with('=') { 1 } else { 2 };
                    return Some(Block::SetextHeading {
                        level,
                        body: InlineContent::Raw(join_stripped(&lines).trim().to_string()),
                    });
                }
            }
            None => {
                // The prefix of some container no longer matches. Peel
                // containers one by one; the line may still lazily continue
                // this paragraph from a shallower stack.
                let mut popped: Vec<Frame> = Vec::new();
                while source.depth() > 1 {
                    popped.push(source.pop_frame().expect("depth checked"));
                    let candidate = source.next_line().filter(|l| !l.is_empty());
                    if candidate.is_some() {
                        if break_paragraph(parser, source, true) {
                            end_parse = true;
                        } else if let Some(line) = source.next_line() {
                            lines.push(line);
                            source.consume();
                        }
                        break;
                    }
                }
                while let Some(frame) = popped.pop() {
                    source.push_frame(frame);
                }
            }
        }
    }
    let body = join_stripped(&lines);
    let body = body.trim_end_matches('\n').to_string();
    Some(Block::Paragraph {
        body: InlineContent::Raw(body),
    })
}

fn join_stripped(lines: &[String]) -> String {
    lines.iter().map(|line| line.trim_start()).collect()
}
