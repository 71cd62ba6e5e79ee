//! HTML blocks, kept verbatim and never inline-parsed.
//!
//! The seven start conditions of CommonMark, each paired with its end
//! condition: a matching close marker for types 1-5, a blank line for
//! types 6 and 7.

use crate::ast::Block;
use crate::inline::patterns;
use crate::source::Source;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref COND_RAW_TAG: Regex =
        Regex::new(r"(?i)\A {0,3}<(script|pre|style|textarea)[>\s]").expect("cond 1");
    static ref COND_COMMENT: Regex = Regex::new(r"\A {0,3}<!--").expect("cond 2");
    static ref COND_PI: Regex = Regex::new(r"\A {0,3}<\?").expect("cond 3");
    static ref COND_DECL: Regex = Regex::new(r"\A {0,3}<![A-Za-z]").expect("cond 4");
    static ref COND_CDATA: Regex = Regex::new(r"\A {0,3}<!\[CDATA\[").expect("cond 5");
    static ref COND_BLOCK_TAG: Regex = Regex::new(&format!(
        r"(?im)\A {{0,3}}</?(?:{})(?:[ \t]+|/?>|$)",
        patterns::BLOCK_TAGS.join("|")
    ))
    .expect("cond 6");
    static ref COND_ANY_TAG: Regex = Regex::new(&format!(
        r"(?m)\A {{0,3}}(<{tag}(?:{attr})*[ \t]*/?>|</{tag}[ \t]*>)[ \t]*$",
        tag = patterns::TAG_NAME,
        attr = patterns::ATTRIBUTE_NO_LF,
    ))
    .expect("cond 7");
}

/// How an HTML block ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlEnd {
    CloseTag(String),
    Comment,
    Pi,
    Decl,
    Cdata,
    BlankLine,
}

impl HtmlEnd {
    fn found_in(&self, line: &str) -> bool {
        match self {
            HtmlEnd::CloseTag(tag) => line
                .to_ascii_lowercase()
                .contains(&format!("</{}>", tag)),
            HtmlEnd::Comment => line.contains("-->"),
            HtmlEnd::Pi => line.contains("?>"),
            HtmlEnd::Decl => line.contains('>'),
            HtmlEnd::Cdata => line.contains("]]>"),
            HtmlEnd::BlankLine => false,
        }
    }
}

/// Match a start condition, returning its type number and end condition.
pub fn match_html_block(source: &mut Source) -> Option<(u8, HtmlEnd)> {
    if let Some(matched) = source.expect_re(&COND_RAW_TAG) {
        let tag = matched.group(1)?.to_ascii_lowercase();
        return Some((1, HtmlEnd::CloseTag(tag)));
    }
    if source.expect_re(&COND_COMMENT).is_some() {
        return Some((2, HtmlEnd::Comment));
    }
    if source.expect_re(&COND_PI).is_some() {
        return Some((3, HtmlEnd::Pi));
    }
    if source.expect_re(&COND_CDATA).is_some() {
        return Some((5, HtmlEnd::Cdata));
    }
    if source.expect_re(&COND_DECL).is_some() {
        return Some((4, HtmlEnd::Decl));
    }
    if source.expect_re(&COND_BLOCK_TAG).is_some() {
        return Some((6, HtmlEnd::BlankLine));
    }
    if source.expect_re(&COND_ANY_TAG).is_some() {
        return Some((7, HtmlEnd::BlankLine));
    }
    None
}

pub fn try_parse(source: &mut Source) -> Option<Block> {
    let (_, end) = match_html_block(source)?;
    let mut lines: Vec<String> = Vec::new();
    while !source.exhausted() {
        let line = match source.next_line() {
            Some(line) => line,
            None => break,
        };
        match &end {
            HtmlEnd::BlankLine => {
                if line.trim().is_empty() {
                    // The blank line stays in the source for the next block.
                    break;
                }
                lines.push(line);
                source.consume();
            }
            cond => {
                lines.push(line.clone());
                source.consume();
                if cond.found_in(&line) {
                    break;
                }
            }
        }
    }
    Some(Block::HtmlBlock {
        body: lines.concat(),
    })
}
