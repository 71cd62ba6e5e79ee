//! Renderer dispatch.
//!
//! Renderers walk the AST and dispatch per element kind name. Extensions
//! contribute render overrides, optionally scoped to one concrete renderer.
//! Dispatch is recursion-safe: a per-call visited set prevents an override
//! that falls back into generic rendering from re-entering itself for the
//! same (kind, renderer) pair.

pub mod ast_json;
pub mod html;
pub mod markdown;

use crate::ast::{Document, ElementRef};
use crate::error::Result;
use std::collections::HashSet;
use std::sync::Arc;

/// Identity of a concrete renderer, used to scope overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererId {
    Html,
    Ast,
    Markdown,
}

/// An extension-supplied render function.
pub type RenderFn =
    Arc<dyn Fn(&mut dyn DynRenderer, ElementRef<'_>, &mut RenderCtx<'_>) -> Result<String> + Send + Sync>;

/// One registered override for a kind name, optionally renderer-scoped.
#[derive(Clone)]
pub struct RenderOverride {
    pub kind: String,
    pub target: Option<RendererId>,
    pub func: RenderFn,
}

impl std::fmt::Debug for RenderOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOverride")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("func", &"<fn>")
            .finish()
    }
}

/// The override table. Later registrations shadow earlier ones.
#[derive(Clone, Default)]
pub struct Overrides {
    entries: Vec<RenderOverride>,
}

impl Overrides {
    pub fn add(&mut self, entry: RenderOverride) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = RenderOverride>) {
        self.entries.extend(entries);
    }

    pub fn lookup(&self, kind: &str, id: RendererId) -> Option<&RenderFn> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.kind == kind && entry.target.map_or(true, |t| t == id))
            .map(|entry| &entry.func)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-call dispatch state: the override table, the recursion guard, and
/// the kinds already reported as dispatch misses.
pub struct RenderCtx<'a> {
    overrides: &'a Overrides,
    visited: Vec<(String, RendererId)>,
    warned: HashSet<String>,
}

impl<'a> RenderCtx<'a> {
    pub fn new(overrides: &'a Overrides) -> Self {
        RenderCtx {
            overrides,
            visited: Vec::new(),
            warned: HashSet::new(),
        }
    }

    /// Report a dispatch miss once per kind, then the caller falls back to
    /// rendering children.
    pub fn warn_dispatch_miss(&mut self, kind: &str) {
        if self.warned.insert(kind.to_string()) {
            log::warn!("no render method for element kind '{}'", kind);
        }
    }
}

/// The object-safe renderer interface used by dispatch and overrides.
pub trait DynRenderer {
    fn id(&self) -> RendererId;

    /// Whether per-kind overrides apply. The AST renderer declares itself
    /// non-delegating so extensions never need to teach it new kinds.
    fn delegating(&self) -> bool {
        true
    }

    /// Render one element, without consulting overrides.
    fn render_element(&mut self, element: ElementRef<'_>, ctx: &mut RenderCtx<'_>)
        -> Result<String>;

    /// Render the children of an element with the renderer's natural join.
    fn render_children(&mut self, element: ElementRef<'_>, ctx: &mut RenderCtx<'_>)
        -> Result<String>;
}

/// Render an element: overrides first (most recent wins), then the
/// renderer itself. The visited set keeps an override from dispatching
/// back into itself for the same element kind.
pub fn dispatch(
    renderer: &mut dyn DynRenderer,
    element: ElementRef<'_>,
    ctx: &mut RenderCtx<'_>,
) -> Result<String> {
    let id = renderer.id();
    if renderer.delegating() {
        let kind = element.kind_name();
        let guarded = ctx.visited.iter().any(|(k, i)| k == kind && *i == id);
        if !guarded {
            if let Some(func) = ctx.overrides.lookup(kind, id) {
                let func = func.clone();
                let kind = kind.to_string();
                ctx.visited.push((kind, id));
                let rendered = (*func)(renderer, element, ctx);
                ctx.visited.pop();
                return rendered;
            }
        }
    }
    renderer.render_element(element, ctx)
}

/// Render a whole document with the given renderer and override table.
pub fn render_document(
    renderer: &mut dyn DynRenderer,
    document: &Document,
    overrides: &Overrides,
) -> Result<String> {
    let mut ctx = RenderCtx::new(overrides);
    dispatch(renderer, ElementRef::Document(document), &mut ctx)
}
