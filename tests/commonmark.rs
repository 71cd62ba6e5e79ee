//! CommonMark behavior cases, table-driven: each case pins the HTML the
//! default engine produces for one construct.

use anyhow::Result;

struct Case {
    section: &'static str,
    markdown: &'static str,
    expected: &'static str,
}

const CASES: &[Case] = &[
    Case {
        section: "ATX headings",
        markdown: "# hello world\n",
        expected: "<h1>hello world</h1>\n",
    },
    Case {
        section: "ATX headings",
        markdown: "###### deep\n",
        expected: "<h6>deep</h6>\n",
    },
    Case {
        section: "ATX headings",
        markdown: "## section ##\n",
        expected: "<h2>section</h2>\n",
    },
    Case {
        section: "Setext headings",
        markdown: "title\n===\n",
        expected: "<h1>title</h1>\n",
    },
    Case {
        section: "Setext headings",
        markdown: "title\n---\n",
        expected: "<h2>title</h2>\n",
    },
    Case {
        section: "Setext headings",
        markdown: "foo\nbar\n---\n",
        expected: "<h2>foo\nbar</h2>\n",
    },
    Case {
        section: "Paragraphs",
        markdown: "just text\n",
        expected: "<p>just text</p>\n",
    },
    Case {
        section: "Paragraphs",
        markdown: "one\n\ntwo\n",
        expected: "<p>one</p>\n<p>two</p>\n",
    },
    Case {
        section: "Paragraphs",
        markdown: "line one\nline two\n",
        expected: "<p>line one\nline two</p>\n",
    },
    Case {
        section: "Hard breaks",
        markdown: "hello  \nworld\n",
        expected: "<p>hello<br />\nworld</p>\n",
    },
    Case {
        section: "Hard breaks",
        markdown: "hello\\\nworld\n",
        expected: "<p>hello<br />\nworld</p>\n",
    },
    Case {
        section: "Thematic breaks",
        markdown: "---\n",
        expected: "<hr />\n",
    },
    Case {
        section: "Thematic breaks",
        markdown: " - - -\n",
        expected: "<hr />\n",
    },
    Case {
        section: "Thematic breaks",
        markdown: "-*-\n",
        expected: "<p>-*-</p>\n",
    },
    Case {
        section: "Code spans",
        markdown: "`code`\n",
        expected: "<p><code>code</code></p>\n",
    },
    Case {
        section: "Code spans",
        markdown: "``a`b``\n",
        expected: "<p><code>a`b</code></p>\n",
    },
    Case {
        section: "Code spans",
        markdown: "`<a href=\"x\">`\n",
        expected: "<p><code>&lt;a href=&quot;x&quot;&gt;</code></p>\n",
    },
    Case {
        section: "Emphasis",
        markdown: "*em* and **strong**\n",
        expected: "<p><em>em</em> and <strong>strong</strong></p>\n",
    },
    Case {
        section: "Emphasis",
        markdown: "*a*b_c_\n",
        expected: "<p><em>a</em>b_c_</p>\n",
    },
    Case {
        section: "Emphasis",
        markdown: "***both***\n",
        expected: "<p><em><strong>both</strong></em></p>\n",
    },
    Case {
        section: "Emphasis",
        markdown: "5 * 3 * 2\n",
        expected: "<p>5 * 3 * 2</p>\n",
    },
    Case {
        section: "Emphasis",
        markdown: "*unclosed\n",
        expected: "<p>*unclosed</p>\n",
    },
    Case {
        section: "Backslash escapes",
        markdown: "\\*literal\\*\n",
        expected: "<p>*literal*</p>\n",
    },
    Case {
        section: "Entities",
        markdown: "&amp; &#65; &copy;\n",
        expected: "<p>&amp; A \u{a9}</p>\n",
    },
    Case {
        section: "Entities",
        markdown: "a & b\n",
        expected: "<p>a &amp; b</p>\n",
    },
    Case {
        section: "Links",
        markdown: "[text](/dest)\n",
        expected: "<p><a href=\"/dest\">text</a></p>\n",
    },
    Case {
        section: "Links",
        markdown: "[text](/dest \"title\")\n",
        expected: "<p><a href=\"/dest\" title=\"title\">text</a></p>\n",
    },
    Case {
        section: "Links",
        markdown: "[x]: /u \"t\"\n[x]\n",
        expected: "<p><a href=\"/u\" title=\"t\">x</a></p>\n",
    },
    Case {
        section: "Links",
        markdown: "[x]: /u\n[y][x] and [x][]\n",
        expected: "<p><a href=\"/u\">y</a> and <a href=\"/u\">x</a></p>\n",
    },
    Case {
        section: "Links",
        markdown: "[undefined]\n",
        expected: "<p>[undefined]</p>\n",
    },
    Case {
        section: "Links",
        markdown: "[a](/b(c))\n",
        expected: "<p><a href=\"/b(c)\">a</a></p>\n",
    },
    Case {
        section: "Links",
        markdown: "[t](</my url>)\n",
        expected: "<p><a href=\"/my%20url\">t</a></p>\n",
    },
    Case {
        section: "Images",
        markdown: "![alt](/img \"t\")\n",
        expected: "<p><img src=\"/img\" alt=\"alt\" title=\"t\" /></p>\n",
    },
    Case {
        section: "Images",
        markdown: "![*em* alt](/img)\n",
        expected: "<p><img src=\"/img\" alt=\"em alt\" /></p>\n",
    },
    Case {
        section: "Autolinks",
        markdown: "<https://example.com>\n",
        expected: "<p><a href=\"https://example.com\">https://example.com</a></p>\n",
    },
    Case {
        section: "Autolinks",
        markdown: "<user@example.com>\n",
        expected: "<p><a href=\"mailto:user@example.com\">user@example.com</a></p>\n",
    },
    Case {
        section: "Raw HTML",
        markdown: "a <b>bold</b> word\n",
        expected: "<p>a <b>bold</b> word</p>\n",
    },
    Case {
        section: "HTML blocks",
        markdown: "<div>\ncontent\n</div>\n",
        expected: "<div>\ncontent\n</div>\n",
    },
    Case {
        section: "HTML blocks",
        markdown: "<!-- hidden -->\nshown\n",
        expected: "<!-- hidden -->\n<p>shown</p>\n",
    },
    Case {
        section: "Indented code",
        markdown: "    fn main() {}\n",
        expected: "<pre><code>fn main() {}\n</code></pre>\n",
    },
    Case {
        section: "Indented code",
        markdown: "    a\n\n    b\n",
        expected: "<pre><code>a\n\nb\n</code></pre>\n",
    },
    Case {
        section: "Fenced code",
        markdown: "```py\nprint(1)\n```\n",
        expected: "<pre><code class=\"language-py\">print(1)\n</code></pre>\n",
    },
    Case {
        section: "Fenced code",
        markdown: "```\n<not html>\n```\n",
        expected: "<pre><code>&lt;not html&gt;\n</code></pre>\n",
    },
    Case {
        section: "Fenced code",
        markdown: "~~~\ntilde fence\n~~~\n",
        expected: "<pre><code>tilde fence\n</code></pre>\n",
    },
    Case {
        section: "Quotes",
        markdown: "> quoted\n",
        expected: "<blockquote>\n<p>quoted</p>\n</blockquote>\n",
    },
    Case {
        section: "Quotes",
        markdown: "> # title\n> body\n",
        expected: "<blockquote>\n<h1>title</h1>\n<p>body</p>\n</blockquote>\n",
    },
    Case {
        section: "Quotes",
        markdown: "> lazy\ncontinuation\n",
        expected: "<blockquote>\n<p>lazy\ncontinuation</p>\n</blockquote>\n",
    },
    Case {
        section: "Lists",
        markdown: "- a\n- b\n",
        expected: "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n",
    },
    Case {
        section: "Lists",
        markdown: "- a\n\n- b\n",
        expected: "<ul>\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ul>\n",
    },
    Case {
        section: "Lists",
        markdown: "1. one\n2. two\n",
        expected: "<ol>\n<li>one</li>\n<li>two</li>\n</ol>\n",
    },
    Case {
        section: "Lists",
        markdown: "5. five\n6. six\n",
        expected: "<ol start=\"5\">\n<li>five</li>\n<li>six</li>\n</ol>\n",
    },
    Case {
        section: "Lists",
        markdown: "- a\n  - b\n",
        expected: "<ul>\n<li>a\n<ul>\n<li>b</li>\n</ul>\n</li>\n</ul>\n",
    },
    Case {
        section: "Lists",
        markdown: "* * *\n* a\n",
        expected: "<hr />\n<ul>\n<li>a</li>\n</ul>\n",
    },
    Case {
        section: "Paragraph interruption",
        markdown: "text\n# heading\n",
        expected: "<p>text</p>\n<h1>heading</h1>\n",
    },
    Case {
        section: "Paragraph interruption",
        markdown: "text\n2. item\n",
        expected: "<p>text\n2. item</p>\n",
    },
    Case {
        section: "Paragraph interruption",
        markdown: "text\n1. item\n",
        expected: "<p>text</p>\n<ol>\n<li>item</li>\n</ol>\n",
    },
    Case {
        section: "Paragraph interruption",
        markdown: "text\n> quote\n",
        expected: "<p>text</p>\n<blockquote>\n<p>quote</p>\n</blockquote>\n",
    },
];

#[test]
fn behavior_cases() -> Result<()> {
    let mut failures = Vec::new();
    for case in CASES {
        let html = vellum::convert(case.markdown);
        if html != case.expected {
            failures.push(format!(
                "[{}] input {:?}\n  expected: {:?}\n  actual:   {:?}",
                case.section, case.markdown, case.expected, html
            ));
        }
    }
    if !failures.is_empty() {
        anyhow::bail!("{} case(s) failed:\n{}", failures.len(), failures.join("\n"));
    }
    Ok(())
}

#[test]
fn link_ref_def_requires_closing_newline() {
    // A definition whose last line has no terminator stays a paragraph.
    let html = vellum::convert("[x]: /u");
    assert_eq!(html, "<p>[x]: /u</p>\n");

    let html = vellum::convert("[x]: /u\n[x]\n");
    assert_eq!(html, "<p><a href=\"/u\">x</a></p>\n");
}

#[test]
fn first_definition_wins() {
    let html = vellum::convert("[x]: /first\n[x]: /second\n[x]\n");
    assert_eq!(html, "<p><a href=\"/first\">x</a></p>\n");
}

#[test]
fn fence_without_close_runs_to_eof() {
    let html = vellum::convert("```\ncode\n");
    assert_eq!(html, "<pre><code>code\n</code></pre>\n");
}

#[test]
fn no_input_is_lost() {
    // Anything unrecognizable still lands in the output as a paragraph.
    let inputs = [
        "]({<\n",
        "*** [\n",
        "[]() ![\n",
        "0. zero?\n",
        "``\n",
        "> \n",
    ];
    for input in inputs {
        let html = vellum::convert(input);
        assert!(!html.is_empty(), "input {:?} produced empty output", input);
    }
}
