//! # Component Module
//!
//! Renderable units and the fallible render step.
//!
//! Rendering is modeled as a result-producing operation: a component
//! either yields a [`View`] or a [`RenderError`]. The error boundary
//! (`boundary` module) is the designated catch point for both explicit
//! failures and panics trapped during a render.
//!
//! [`RenderCtx`] tracks the stack of component names currently being
//! rendered. The stack is diagnostic only: it feeds
//! [`ErrorContext::component_stack`] and is never used for control flow.

use crate::boundary::ErrorBoundary;
use crate::limits::MAX_RENDER_DEPTH;
use crate::view::View;
use thiserror::Error;

// =============================================================================
// RENDER ERRORS
// =============================================================================

/// Result of rendering one component or subtree.
pub type RenderResult = Result<View, RenderError>;

/// The single fault kind the error boundary handles.
///
/// No distinction is made beyond how the fault was raised; the message
/// is shown to the user verbatim in either case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A component returned an explicit failure.
    #[error("{0}")]
    Failed(String),
    /// A panic was trapped while rendering a subtree.
    #[error("{0}")]
    Panicked(String),
}

impl RenderError {
    /// Create an explicit render failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        RenderError::Failed(message.into())
    }

    /// The message text, exactly as it will be displayed.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            RenderError::Failed(m) | RenderError::Panicked(m) => m,
        }
    }
}

impl From<String> for RenderError {
    fn from(message: String) -> Self {
        RenderError::Failed(message)
    }
}

impl From<&str> for RenderError {
    fn from(message: &str) -> Self {
        RenderError::Failed(message.to_owned())
    }
}

/// Diagnostic context captured alongside a fault.
///
/// Informational only; nothing in the boundary reads it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// `    at Name` lines, innermost frame first.
    pub component_stack: String,
}

impl ErrorContext {
    /// Build a context from a component stack string.
    #[must_use]
    pub fn new(component_stack: impl Into<String>) -> Self {
        Self {
            component_stack: component_stack.into(),
        }
    }
}

/// Stringify a trapped panic payload.
///
/// Panic payloads are `&str` or `String` in practice; anything else is
/// reported as an unknown panic.
#[must_use]
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic")
    }
}

// =============================================================================
// COMPONENT TRAIT
// =============================================================================

/// A renderable unit.
///
/// Components may hold state (`render` takes `&mut self`), but most are
/// plain carriers of precomputed data. The default diagnostic name is
/// the literal `"Component"` for units that expose none.
pub trait Component {
    /// Diagnostic display name used in component stacks and by the
    /// wrapping adapter's name derivation.
    fn name(&self) -> &str {
        "Component"
    }

    /// Produce this component's view, or fail.
    fn render(&mut self, ctx: &mut RenderCtx) -> RenderResult;
}

// =============================================================================
// RENDER CONTEXT
// =============================================================================

/// Per-render bookkeeping shared down one render pass.
///
/// Owns the component-name stack. Frames are popped only on successful
/// render so that, at the moment a boundary captures a fault, the stack
/// still names the failing path; the boundary truncates it afterwards.
#[derive(Debug, Default)]
pub struct RenderCtx {
    stack: Vec<String>,
}

impl RenderCtx {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one component with stack bookkeeping and depth bounding.
    ///
    /// This is the canonical "render subtree" step: every dynamic child
    /// render goes through here so the diagnostic stack stays accurate.
    pub fn render(&mut self, component: &mut dyn Component) -> RenderResult {
        if self.stack.len() >= MAX_RENDER_DEPTH {
            return Err(RenderError::failed(format!(
                "render depth limit of {MAX_RENDER_DEPTH} exceeded"
            )));
        }
        let name = component.name().to_owned();
        self.stack.push(name);
        let view = component.render(self)?;
        self.stack.pop();
        Ok(view)
    }

    /// Current stack depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Format the current stack, innermost frame first.
    #[must_use]
    pub fn component_stack(&self) -> String {
        let mut lines = Vec::with_capacity(self.stack.len());
        for name in self.stack.iter().rev() {
            lines.push(format!("    at {name}"));
        }
        lines.join("\n")
    }

    /// Drop frames left behind by a captured fault.
    pub(crate) fn truncate(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }
}

// =============================================================================
// CHILDREN
// =============================================================================

/// One entry of a boundary's subtree.
///
/// Text and pre-built views are infallible; components are the fallible
/// step; a nested boundary renders its own subtree and never propagates
/// a fault upward.
pub enum Child {
    /// Literal text.
    Text(String),
    /// A pre-built view.
    View(View),
    /// A dynamic component.
    ///
    /// `Send` so a mounted tree can live behind shared server state.
    Component(Box<dyn Component + Send>),
    /// A nested boundary with its own isolated state.
    Boundary(ErrorBoundary),
}

impl Child {
    /// Wrap a component as a child.
    #[must_use]
    pub fn component(component: impl Component + Send + 'static) -> Self {
        Child::Component(Box::new(component))
    }
}

impl std::fmt::Debug for Child {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Child::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Child::View(_) => f.write_str("View(..)"),
            Child::Component(c) => f.debug_tuple("Component").field(&c.name()).finish(),
            Child::Boundary(_) => f.write_str("Boundary(..)"),
        }
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_owned())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<View> for Child {
    fn from(view: View) -> Self {
        Child::View(view)
    }
}

impl From<ErrorBoundary> for Child {
    fn from(boundary: ErrorBoundary) -> Self {
        Child::Boundary(boundary)
    }
}

/// Render one child.
pub(crate) fn render_child(child: &mut Child, ctx: &mut RenderCtx) -> RenderResult {
    match child {
        Child::Text(t) => Ok(View::text(t.clone())),
        Child::View(v) => Ok(v.clone()),
        Child::Component(c) => ctx.render(c.as_mut()),
        Child::Boundary(b) => Ok(b.render(ctx)),
    }
}

/// Render a whole subtree, short-circuiting on the first fault.
///
/// A single child's output is returned as-is so a healthy boundary adds
/// no wrapper artifacts; multiple children become a fragment.
pub(crate) fn render_children(children: &mut [Child], ctx: &mut RenderCtx) -> RenderResult {
    let mut rendered = Vec::with_capacity(children.len());
    for child in children.iter_mut() {
        rendered.push(render_child(child, ctx)?);
    }
    if rendered.len() == 1 {
        return Ok(rendered.pop().unwrap_or_else(View::empty));
    }
    Ok(View::Fragment(rendered))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::el;

    struct Static(&'static str);

    impl Component for Static {
        fn name(&self) -> &str {
            "Static"
        }

        fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
            Ok(View::text(self.0))
        }
    }

    struct Failing;

    impl Component for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
            Err(RenderError::failed("data source unavailable"))
        }
    }

    struct Recursive;

    impl Component for Recursive {
        fn name(&self) -> &str {
            "Recursive"
        }

        fn render(&mut self, ctx: &mut RenderCtx) -> RenderResult {
            ctx.render(&mut Recursive)
        }
    }

    #[test]
    fn default_component_name_is_literal() {
        struct Anonymous;
        impl Component for Anonymous {
            fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
                Ok(View::empty())
            }
        }
        assert_eq!(Anonymous.name(), "Component");
    }

    #[test]
    fn error_message_is_verbatim() {
        let err = RenderError::failed("budget total out of range");
        assert_eq!(err.message(), "budget total out of range");
        assert_eq!(err.to_string(), "budget total out of range");
    }

    #[test]
    fn ctx_render_pops_frame_on_success() {
        let mut ctx = RenderCtx::new();
        let view = ctx.render(&mut Static("hello"));
        assert_eq!(view, Ok(View::text("hello")));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn ctx_render_keeps_frame_on_failure() {
        let mut ctx = RenderCtx::new();
        let result = ctx.render(&mut Failing);
        assert!(result.is_err());
        assert_eq!(ctx.depth(), 1);
        assert_eq!(ctx.component_stack(), "    at Failing");
    }

    #[test]
    fn depth_limit_turns_runaway_recursion_into_a_fault() {
        let mut ctx = RenderCtx::new();
        let result = ctx.render(&mut Recursive);
        let message = result.err().map(|e| e.message().to_owned());
        assert!(
            message
                .as_deref()
                .is_some_and(|m| m.contains("render depth limit")),
            "expected depth-limit fault, got {message:?}"
        );
    }

    #[test]
    fn render_children_unwraps_single_child() {
        let mut ctx = RenderCtx::new();
        let expected: View = el("p").text("only").into();
        let mut children = vec![Child::View(expected.clone())];
        assert_eq!(render_children(&mut children, &mut ctx), Ok(expected));
    }

    #[test]
    fn render_children_fragments_siblings() {
        let mut ctx = RenderCtx::new();
        let mut children = vec![Child::from("a"), Child::from("b")];
        let view = render_children(&mut children, &mut ctx);
        assert_eq!(
            view,
            Ok(View::Fragment(vec![View::text("a"), View::text("b")]))
        );
    }

    #[test]
    fn panic_message_downcasts_common_payloads() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static payload");
        assert_eq!(panic_message(boxed.as_ref()), "static payload");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned payload"));
        assert_eq!(panic_message(boxed.as_ref()), "owned payload");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(17_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
