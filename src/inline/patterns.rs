//! Shared pattern text for HTML tags and link parts.

use lazy_static::lazy_static;
use regex::Regex;

/// The block-level tag names of HTML block type 6.
pub const BLOCK_TAGS: [&str; 63] = [
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption",
    "center", "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2",
    "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "iframe", "legend", "li",
    "link", "main", "menu", "menuitem", "meta", "nav", "noframes", "ol", "optgroup",
    "option", "p", "param", "section", "source", "summary", "table", "tbody", "td",
    "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

pub const TAG_NAME: &str = r"[A-Za-z][A-Za-z0-9-]*";

pub const ATTRIBUTE: &str =
    r#"\s+[A-Za-z:_][A-Za-z0-9\-_.:]*(?:\s*=\s*(?:[^\s"'`=<>]+|'[^']*'|"[^"]*"))?"#;

pub const ATTRIBUTE_NO_LF: &str =
    r#"[^\S\n]+[A-Za-z:_][A-Za-z0-9\-_.:]*(?:[^\S\n]*=[^\S\n]*(?:[^\s"'`=<>]+|'[^\n']*'|"[^\n"]*"))?"#;

lazy_static! {
    /// An open tag with attributes, anchored for the inline scanner.
    pub static ref OPEN_TAG: Regex = Regex::new(&format!(
        r"\A<{}(?:{})*\s*/?>",
        TAG_NAME, ATTRIBUTE
    ))
    .expect("open tag regex");

    /// A closing tag, anchored for the inline scanner.
    pub static ref CLOSING_TAG: Regex =
        Regex::new(&format!(r"\A</{}\s*>", TAG_NAME)).expect("closing tag regex");

    /// A processing instruction.
    pub static ref PROCESSING: Regex =
        Regex::new(r"\A<\?[\s\S]*?\?>").expect("processing instruction regex");

    /// A declaration.
    pub static ref DECLARATION: Regex =
        Regex::new(r"\A<![A-Z]+[ \t][\s\S]*?>").expect("declaration regex");

    /// A CDATA section.
    pub static ref CDATA: Regex =
        Regex::new(r"\A<!\[CDATA\[[\s\S]*?\]\]>").expect("cdata regex");

    /// An angle-bracketed link destination.
    pub static ref LINK_DEST_ANGLE: Regex =
        Regex::new(r"\A<(?:\\.|[^\n\\<>])*>").expect("angle dest regex");

    /// An optional link label used by full and collapsed reference links.
    pub static ref OPTIONAL_LABEL: Regex =
        Regex::new(r"\A\[(?:\\\\|\\[\[\]]|[^\[\]])*\]").expect("label regex");
}
