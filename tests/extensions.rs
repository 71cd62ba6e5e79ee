//! End-to-end exercises of the extension mechanism: custom inline and
//! block kinds, render overrides (global and renderer-scoped), the named
//! loader, and the equal-priority tie-break.

use std::sync::Arc;
use vellum::ast::{CustomBlock, CustomBlockChildren, CustomInline};
use vellum::block::BlockContext;
use vellum::inline::{InlineMatch, MatchPayload};
use vellum::{
    Block, BlockRule, ElementSpec, Extension, ExtensionOptions, Inline, InlineContent,
    InlineRule, Markdown, RenderOverride, RendererChoice, RendererId, Result, Source,
};

// ---------------------------------------------------------------------------
// A `==mark==` inline element
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct MarkRule;

impl InlineRule for MarkRule {
    fn spec(&self) -> ElementSpec {
        ElementSpec::new("mark", 6)
    }

    fn find(&self, text: &str) -> Vec<InlineMatch> {
        let bytes = text.as_bytes();
        let mut out = Vec::new();
        let mut i = 0;
        while i + 1 < bytes.len() {
            if bytes[i] == b'=' && bytes[i + 1] == b'=' {
                if let Some(offset) = text[i + 2..].find("==") {
                    if offset > 0 {
                        let inner_end = i + 2 + offset;
                        out.push(InlineMatch {
                            start: i,
                            end: inner_end + 2,
                            inner_start: i + 2,
                            inner_end,
                            parse_children: true,
                            payload: MatchPayload::Custom {
                                data: serde_json::Map::new(),
                            },
                        });
                        i = inner_end + 2;
                        continue;
                    }
                }
            }
            i += 1;
        }
        out
    }

    fn build(&self, _matched: &InlineMatch, children: Vec<Inline>) -> Inline {
        Inline::Custom(CustomInline {
            kind: "mark".to_string(),
            data: serde_json::Map::new(),
            children,
        })
    }
}

fn mark_extension() -> Extension {
    Extension::new("mark")
        .with_inline_rule(Arc::new(MarkRule))
        .with_render_override(RenderOverride {
            kind: "mark".to_string(),
            target: Some(RendererId::Html),
            func: Arc::new(|renderer, element, ctx| {
                let inner = renderer.render_children(element, ctx)?;
                Ok(format!("<mark>{}</mark>", inner))
            }),
        })
}

fn make_mark(_options: &ExtensionOptions) -> Result<Extension> {
    Ok(mark_extension())
}

#[test]
fn custom_inline_with_html_override() {
    let mut md = Markdown::new();
    md.use_extension(mark_extension()).expect("register");
    let html = md.convert("a ==hot *stuff*== b\n").expect("convert");
    assert_eq!(html, "<p>a <mark>hot <em>stuff</em></mark> b</p>\n");
}

#[test]
fn scoped_override_only_applies_to_its_renderer() {
    // The override targets HTML; the Markdown renderer falls back to a
    // dispatch miss and renders the children bare.
    let mut md = Markdown::with_renderer(RendererChoice::Markdown);
    md.use_extension(mark_extension()).expect("register");
    let out = md.convert("==marked==\n").expect("convert");
    assert_eq!(out, "marked\n");
}

#[test]
fn unknown_custom_kind_falls_back_to_children() {
    // Without any override the HTML renderer reports the miss once and
    // renders the children.
    let mut md = Markdown::new();
    md.use_extension(Extension::new("bare-mark").with_inline_rule(Arc::new(MarkRule)))
        .expect("register");
    let html = md.convert("==plain==\n").expect("convert");
    assert_eq!(html, "<p>plain</p>\n");
}

#[test]
fn loader_resolves_factories() {
    let mut md = Markdown::new();
    md.register_extension_factory("mark", make_mark);
    md.use_by_name("mark", &ExtensionOptions::new()).expect("load");
    let html = md.convert("==x==\n").expect("convert");
    assert_eq!(html, "<p><mark>x</mark></p>\n");
}

#[test]
fn unknown_extension_aborts_before_parsing() {
    let mut md = Markdown::new();
    let error = md
        .use_by_name("does-not-exist", &ExtensionOptions::new())
        .expect_err("unknown extension");
    assert!(format!("{}", error).contains("does-not-exist"));
}

// ---------------------------------------------------------------------------
// A `!!!` callout block element
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct CalloutRule;

impl BlockRule for CalloutRule {
    fn spec(&self) -> ElementSpec {
        ElementSpec::new("callout", 8)
    }

    fn try_parse(
        &self,
        source: &mut Source,
        _ctx: &mut BlockContext<'_>,
    ) -> Option<Result<Block>> {
        let line = source.current_line()?;
        let rest = line.strip_prefix("!!! ")?;
        let body = rest.trim_end().to_string();
        source.consume_line();
        Some(Ok(Block::Custom(CustomBlock {
            kind: "callout".to_string(),
            data: serde_json::Map::new(),
            children: CustomBlockChildren::Inline(InlineContent::Raw(body)),
        })))
    }
}

#[test]
fn custom_block_with_override_and_inline_pass() {
    let mut md = Markdown::new();
    md.use_extension(
        Extension::new("callout")
            .with_block_rule(Arc::new(CalloutRule))
            .with_render_override(RenderOverride {
                kind: "callout".to_string(),
                target: None,
                func: Arc::new(|renderer, element, ctx| {
                    let inner = renderer.render_children(element, ctx)?;
                    Ok(format!("<aside class=\"callout\">{}</aside>\n", inner))
                }),
            }),
    )
    .expect("register");
    let html = md.convert("!!! watch *out*\n\nafter\n").expect("convert");
    assert_eq!(
        html,
        "<aside class=\"callout\">watch <em>out</em></aside>\n<p>after</p>\n"
    );
}

#[test]
fn custom_block_serializes_generically_in_ast() {
    // The AST renderer is non-delegating: the new kind needs no teaching.
    let mut md = Markdown::with_renderer(RendererChoice::Ast);
    md.use_extension(Extension::new("callout").with_block_rule(Arc::new(CalloutRule)))
        .expect("register");
    let out = md.convert("!!! note\n").expect("convert");
    assert!(out.contains("\"element\":\"callout\""));
}

// ---------------------------------------------------------------------------
// Equal-priority tie-break
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct TaggedRule {
    kind: &'static str,
}

impl InlineRule for TaggedRule {
    fn spec(&self) -> ElementSpec {
        ElementSpec::new(self.kind, 6)
    }

    fn find(&self, text: &str) -> Vec<InlineMatch> {
        match text.find("@@x@@") {
            Some(start) => vec![InlineMatch {
                start,
                end: start + 5,
                inner_start: start + 2,
                inner_end: start + 3,
                parse_children: false,
                payload: MatchPayload::Custom {
                    data: serde_json::Map::new(),
                },
            }],
            None => Vec::new(),
        }
    }

    fn build(&self, _matched: &InlineMatch, _children: Vec<Inline>) -> Inline {
        Inline::Custom(CustomInline {
            kind: self.kind.to_string(),
            data: serde_json::Map::new(),
            children: vec![Inline::RawText {
                text: self.kind.to_string(),
                escape: true,
            }],
        })
    }
}

#[test]
fn equal_span_equal_priority_goes_to_earlier_registration() {
    let mut md = Markdown::new();
    md.use_extension(
        Extension::new("tie")
            .with_inline_rule(Arc::new(TaggedRule { kind: "alpha" }))
            .with_inline_rule(Arc::new(TaggedRule { kind: "beta" })),
    )
    .expect("register");
    let html = md.convert("@@x@@\n").expect("convert");
    // Both rules match the same span with the same priority; the one
    // registered first wins and the fallback renders its children.
    assert_eq!(html, "<p>alpha</p>\n");
}

#[test]
fn overriding_a_registered_kind_requires_the_flag() {
    let mut md = Markdown::new();
    md.use_extension(Extension::new("first").with_inline_rule(Arc::new(MarkRule)))
        .expect("register");
    let error = md
        .use_extension(Extension::new("dup").with_inline_rule(Arc::new(MarkRule)))
        .expect_err("duplicate kind");
    assert!(format!("{}", error).contains("already registered"));

    #[derive(Debug)]
    struct OverridingMark;
    impl InlineRule for OverridingMark {
        fn spec(&self) -> ElementSpec {
            ElementSpec::new("mark", 6).overriding()
        }
        fn find(&self, _text: &str) -> Vec<InlineMatch> {
            Vec::new()
        }
        fn build(&self, _matched: &InlineMatch, children: Vec<Inline>) -> Inline {
            Inline::Custom(CustomInline {
                kind: "mark".to_string(),
                data: serde_json::Map::new(),
                children,
            })
        }
    }

    let mut md = Markdown::new();
    md.use_extension(Extension::new("first").with_inline_rule(Arc::new(MarkRule)))
        .expect("register");
    md.use_extension(Extension::new("second").with_inline_rule(Arc::new(OverridingMark)))
        .expect("override accepted");
    // The overriding rule matches nothing, so the syntax degrades to text.
    let html = md.convert("==x==\n").expect("convert");
    assert_eq!(html, "<p>==x==</p>\n");
}
