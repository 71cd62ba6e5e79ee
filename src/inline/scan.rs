//! Hand-coded Phase A finders: backslash literals, code spans, raw inline
//! HTML, autolinks, character references and line breaks.
//!
//! Each finder returns the non-overlapping matches of its own kind in
//! left-to-right order; overlaps between kinds are resolved later by the
//! token relation machinery.

use crate::ast::LinkRefDefs;
use crate::inline::emphasis;
use crate::inline::patterns;
use crate::inline::{InlineMatch, MatchPayload};
use crate::registry::BuiltinInline;
use nom::branch::alt;
use nom::bytes::complete::{take_while, take_while1};
use nom::character::complete::char;
use nom::combinator::{map, recognize, verify};
use nom::sequence::{preceded, tuple};
use nom::IResult;

pub fn find_builtin(kind: BuiltinInline, text: &str, defs: &LinkRefDefs) -> Vec<InlineMatch> {
    match kind {
        BuiltinInline::Literal => find_literal(text),
        BuiltinInline::CodeSpan => find_code_span(text),
        BuiltinInline::InlineHtml => find_inline_html(text),
        BuiltinInline::AutoLink => find_auto_link(text),
        BuiltinInline::Entity => find_entity(text),
        BuiltinInline::LineBreak => find_line_break(text),
        BuiltinInline::LinkOrEmph => emphasis::find_links_or_emphs(text, defs),
    }
}

fn find_literal(text: &str) -> Vec<InlineMatch> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\\' && bytes[i + 1].is_ascii_punctuation() {
            out.push(InlineMatch {
                start: i,
                end: i + 2,
                inner_start: i + 1,
                inner_end: i + 2,
                parse_children: false,
                payload: MatchPayload::Literal {
                    text: (bytes[i + 1] as char).to_string(),
                },
            });
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

/// A code span starting at `i` (which must point at a backtick that is not
/// preceded by another). Returns `(end, inner_start, inner_end)` where the
/// inner span is the content between the equal-length backtick runs.
pub(crate) fn code_span_at(text: &str, i: usize) -> Option<(usize, usize, usize)> {
    let bytes = text.as_bytes();
    if bytes.get(i) != Some(&b'`') {
        return None;
    }
    let mut content_start = i;
    while bytes.get(content_start) == Some(&b'`') {
        content_start += 1;
    }
    let open_len = content_start - i;
    let mut k = content_start;
    while k < bytes.len() {
        if bytes[k] == b'`' {
            let run_start = k;
            while bytes.get(k) == Some(&b'`') {
                k += 1;
            }
            if k - run_start == open_len && run_start > content_start {
                return Some((k, content_start, run_start));
            }
        } else {
            k += 1;
        }
    }
    None
}

fn find_code_span(text: &str) -> Vec<InlineMatch> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'`' && (i == 0 || bytes[i - 1] != b'`') {
            if let Some((end, inner_start, inner_end)) = code_span_at(text, i) {
                let mut content = text[inner_start..inner_end].replace('\n', " ");
                if !content.trim().is_empty()
                    && content.len() > 1
                    && content.starts_with(' ')
                    && content.ends_with(' ')
                {
                    content = content[1..content.len() - 1].to_string();
                }
                out.push(InlineMatch {
                    start: i,
                    end,
                    inner_start,
                    inner_end,
                    parse_children: false,
                    payload: MatchPayload::CodeSpan { text: content },
                });
                i = end;
                continue;
            }
        }
        i += 1;
    }
    out
}

fn find_inline_html(text: &str) -> Vec<InlineMatch> {
    let mut out = Vec::new();
    let mut i = 0;
    while let Some(offset) = text[i..].find('<') {
        let at = i + offset;
        match inline_html_at(text, at) {
            Some(end) => {
                out.push(InlineMatch {
                    start: at,
                    end,
                    inner_start: at,
                    inner_end: end,
                    parse_children: false,
                    payload: MatchPayload::InlineHtml,
                });
                i = end;
            }
            None => i = at + 1,
        }
    }
    out
}

fn inline_html_at(text: &str, at: usize) -> Option<usize> {
    let slice = &text[at..];
    if slice.starts_with("<!--") {
        return comment_end(slice).map(|end| at + end);
    }
    for re in [
        &*patterns::OPEN_TAG,
        &*patterns::CLOSING_TAG,
        &*patterns::PROCESSING,
        &*patterns::DECLARATION,
        &*patterns::CDATA,
    ] {
        if let Some(m) = re.find(slice) {
            return Some(at + m.end());
        }
    }
    None
}

/// An HTML comment: `<!-->`, `<!--->`, or `<!--` text `-->` where the text
/// neither starts with `>`/`->`, ends with `-`, nor contains `--`.
fn comment_end(slice: &str) -> Option<usize> {
    if slice.starts_with("<!-->") {
        return Some(5);
    }
    if slice.starts_with("<!--->") {
        return Some(6);
    }
    let body_start = 4;
    let close = slice[body_start..].find("-->")? + body_start;
    let body = &slice[body_start..close];
    if body.starts_with('>') || body.starts_with("->") || body.ends_with('-') || body.contains("--")
    {
        return None;
    }
    Some(close + 3)
}

fn parse_uri(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        verify(
            take_while1(|c: char| {
                c.is_ascii_alphanumeric() || c == '+' || c == '.' || c == '-'
            }),
            |scheme: &str| {
                (2..=32).contains(&scheme.len())
                    && scheme
                        .chars()
                        .next()
                        .map_or(false, |c| c.is_ascii_alphabetic())
            },
        ),
        char(':'),
        take_while(|c: char| !c.is_whitespace() && c != '<' && c != '>'),
    )))(input)
}

fn parse_email(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        take_while1(|c: char| {
            c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c)
        }),
        char('@'),
        verify(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '.' || c == '-'),
            |domain: &str| !domain.starts_with('-') && !domain.ends_with('-'),
        ),
    )))(input)
}

/// `<uri>` or `<email>`; the boolean marks the email form.
fn parse_autolink(input: &str) -> IResult<&str, (&str, bool)> {
    map(
        tuple((
            char('<'),
            alt((
                map(parse_uri, |body| (body, false)),
                map(parse_email, |body| (body, true)),
            )),
            char('>'),
        )),
        |(_, body, _)| body,
    )(input)
}

/// A character reference: `&name;`, `&#digits;` or `&#xhex;`.
fn parse_entity_ref(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        char('&'),
        alt((
            recognize(tuple((
                verify(
                    take_while1(|c: char| c.is_ascii_alphanumeric()),
                    |name: &str| {
                        name.len() <= 32
                            && name
                                .chars()
                                .next()
                                .map_or(false, |c| c.is_ascii_alphabetic())
                    },
                ),
                char(';'),
            ))),
            recognize(tuple((
                char('#'),
                alt((
                    preceded(
                        alt((char('x'), char('X'))),
                        verify(
                            take_while1(|c: char| c.is_ascii_hexdigit()),
                            |digits: &str| digits.len() <= 6,
                        ),
                    ),
                    verify(
                        take_while1(|c: char| c.is_ascii_digit()),
                        |digits: &str| digits.len() <= 7,
                    ),
                )),
                char(';'),
            ))),
        )),
    )))(input)
}

fn find_auto_link(text: &str) -> Vec<InlineMatch> {
    let mut out = Vec::new();
    let mut i = 0;
    while let Some(offset) = text[i..].find('<') {
        let at = i + offset;
        match parse_autolink(&text[at..]) {
            Ok((rest, (body, is_email))) => {
                let end = at + (text[at..].len() - rest.len());
                let label = body.to_string();
                let dest = if is_email {
                    format!("mailto:{}", label)
                } else {
                    label.clone()
                };
                out.push(InlineMatch {
                    start: at,
                    end,
                    inner_start: at + 1,
                    inner_end: end - 1,
                    parse_children: false,
                    payload: MatchPayload::AutoLink { dest, label },
                });
                i = end;
            }
            Err(_) => i = at + 1,
        }
    }
    out
}

fn find_entity(text: &str) -> Vec<InlineMatch> {
    let mut out = Vec::new();
    let mut i = 0;
    while let Some(offset) = text[i..].find('&') {
        let at = i + offset;
        match parse_entity_ref(&text[at..]) {
            Ok((rest, _)) => {
                let end = at + (text[at..].len() - rest.len());
                out.push(InlineMatch {
                    start: at,
                    end,
                    inner_start: at,
                    inner_end: end,
                    parse_children: false,
                    payload: MatchPayload::Entity,
                });
                i = end;
            }
            Err(_) => i = at + 1,
        }
    }
    out
}

fn find_line_break(text: &str) -> Vec<InlineMatch> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    for (i, byte) in bytes.iter().enumerate() {
        // A newline at the very end of the body is no break at all.
        if *byte != b'\n' || i + 1 >= bytes.len() {
            continue;
        }
        let mut run_start = i;
        while run_start > 0 && bytes[run_start - 1] == b' ' {
            run_start -= 1;
        }
        let (start, soft) = if run_start == i && i > 0 && bytes[i - 1] == b'\\' {
            (i - 1, false)
        } else {
            (run_start, i - run_start < 2)
        };
        out.push(InlineMatch {
            start,
            end: i + 1,
            inner_start: start,
            inner_end: i + 1,
            parse_children: false,
            payload: MatchPayload::LineBreak { soft },
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(matches: &[InlineMatch]) -> Vec<(usize, usize)> {
        matches.iter().map(|m| (m.start, m.end)).collect()
    }

    #[test]
    fn literal_escapes_only_punctuation() {
        let found = find_literal(r"\*a\b\\");
        assert_eq!(spans(&found), vec![(0, 2), (5, 7)]);
    }

    #[test]
    fn code_span_requires_equal_runs() {
        let found = find_code_span("``a`b``");
        assert_eq!(spans(&found), vec![(0, 7)]);
        match &found[0].payload {
            MatchPayload::CodeSpan { text } => assert_eq!(text, "a`b"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn code_span_trims_single_framing_spaces() {
        let found = find_code_span("` code `");
        match &found[0].payload {
            MatchPayload::CodeSpan { text } => assert_eq!(text, "code"),
            other => panic!("unexpected {:?}", other),
        }
        // All-space content keeps its spaces.
        let found = find_code_span("`  `");
        match &found[0].payload {
            MatchPayload::CodeSpan { text } => assert_eq!(text, "  "),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn autolink_email_gets_mailto() {
        let found = find_auto_link("<user@example.com>");
        match &found[0].payload {
            MatchPayload::AutoLink { dest, label } => {
                assert_eq!(dest, "mailto:user@example.com");
                assert_eq!(label, "user@example.com");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn autolink_requires_a_scheme_or_address() {
        assert!(find_auto_link("<not a link>").is_empty());
        assert_eq!(find_auto_link("<https://x.y>").len(), 1);
    }

    #[test]
    fn entity_reference_shapes() {
        assert_eq!(find_entity("&amp;").len(), 1);
        assert_eq!(find_entity("&#35;").len(), 1);
        assert_eq!(find_entity("&#xCAFE;").len(), 1);
        assert!(find_entity("&;").is_empty());
        assert!(find_entity("& loose").is_empty());
    }

    #[test]
    fn hard_and_soft_breaks() {
        let found = find_line_break("a  \nb\nc");
        assert_eq!(found.len(), 2);
        assert!(matches!(
            found[0].payload,
            MatchPayload::LineBreak { soft: false }
        ));
        assert_eq!((found[0].start, found[0].end), (1, 4));
        assert!(matches!(
            found[1].payload,
            MatchPayload::LineBreak { soft: true }
        ));

        let found = find_line_break("a\\\nb");
        assert!(matches!(
            found[0].payload,
            MatchPayload::LineBreak { soft: false }
        ));
    }

    #[test]
    fn trailing_newline_is_not_a_break() {
        assert!(find_line_break("line\n").is_empty());
    }

    #[test]
    fn comment_shapes() {
        assert_eq!(comment_end("<!-- ok -->"), Some(11));
        assert_eq!(comment_end("<!-->"), Some(5));
        assert_eq!(comment_end("<!-- a -- b -->"), None);
    }
}
