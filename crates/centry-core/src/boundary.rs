//! # Error Boundary Module
//!
//! Stateful isolation wrapper around a render subtree.
//!
//! A boundary renders its children and captures any fault raised while
//! doing so, whether the fault is an explicit [`RenderError`] or a
//! trapped panic. On capture it records the error, reports it to the
//! log and to an optional observer, and substitutes fallback content.
//! The surrounding tree keeps rendering; a fault never escapes its
//! nearest enclosing boundary, no matter how deep the failing node sat.
//!
//! ## State machine
//!
//! ```text
//! healthy --capture--> faulted --reset--> healthy
//! ```
//!
//! A faulted boundary skips its subtree entirely and renders fallback
//! content on every pass until [`ErrorBoundary::reset`] is called.
//! Reset is the only transition back to healthy; re-rendering alone
//! never clears a fault.

use crate::component::{
    panic_message, render_children, Child, ErrorContext, RenderCtx, RenderError,
};
use crate::fallback::{render_default_fallback, Fallback};
use crate::view::View;
use std::cell::Cell;
use std::sync::Once;

// =============================================================================
// BOUNDARY STATE
// =============================================================================

/// Observable state of one boundary instance.
///
/// Invariant: `has_error()` is `true` exactly when `error()` is `Some`.
/// Both fields change together in `capture` and `reset`; no other code
/// writes them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryState {
    has_error: bool,
    error: Option<RenderError>,
}

impl BoundaryState {
    /// Whether a fault is currently held.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// The held fault, if any.
    #[must_use]
    pub fn error(&self) -> Option<&RenderError> {
        self.error.as_ref()
    }
}

/// Callback invoked once per captured fault.
pub type ErrorObserver = Box<dyn FnMut(&RenderError, &ErrorContext) + Send>;

// =============================================================================
// ERROR BOUNDARY
// =============================================================================

/// Catches faults raised while rendering its children and shows
/// fallback content in their place.
pub struct ErrorBoundary {
    children: Vec<Child>,
    state: BoundaryState,
    fallback: Fallback,
    reset_action: Option<String>,
    observer: Option<ErrorObserver>,
}

impl ErrorBoundary {
    /// Create an empty, healthy boundary with the default fallback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            state: BoundaryState::default(),
            fallback: Fallback::Default,
            reset_action: None,
            observer: None,
        }
    }

    /// Replace the default fallback content.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Replace the fallback on an already-built boundary.
    pub fn set_fallback(&mut self, fallback: Fallback) {
        self.fallback = fallback;
    }

    /// Give the default fallback a "Try again" form posting to `action`.
    ///
    /// Without one, the fallback offers no retry control; nothing else
    /// can reach [`ErrorBoundary::reset`] from rendered output.
    #[must_use]
    pub fn with_reset_action(mut self, action: impl Into<String>) -> Self {
        self.reset_action = Some(action.into());
        self
    }

    /// Register a capture observer.
    ///
    /// The observer runs inside the trap: if it panics, the panic is
    /// swallowed and the capture still completes.
    #[must_use]
    pub fn with_observer(
        mut self,
        observer: impl FnMut(&RenderError, &ErrorContext) + Send + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Append a child, builder style.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a child.
    pub fn push_child(&mut self, child: impl Into<Child>) {
        self.children.push(child.into());
    }

    /// Replace the whole subtree.
    ///
    /// Fault state is untouched: a faulted boundary stays faulted even
    /// with new children until it is reset.
    pub fn set_children(&mut self, children: Vec<Child>) {
        self.children = children;
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    /// Whether this boundary is showing fallback content.
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        self.state.has_error
    }

    /// The captured fault, if any.
    #[must_use]
    pub fn captured_error(&self) -> Option<&RenderError> {
        self.state.error.as_ref()
    }

    /// Render the subtree, or fallback content while faulted.
    ///
    /// Never fails: this is the point where faults stop propagating.
    pub fn render(&mut self, ctx: &mut RenderCtx) -> View {
        debug_assert_eq!(self.state.has_error, self.state.error.is_some());
        if self.state.has_error {
            return self.fallback_view();
        }
        let depth = ctx.depth();
        let outcome = trap(|| render_children(&mut self.children, ctx));
        match outcome {
            Ok(Ok(view)) => view,
            Ok(Err(error)) => self.capture(error, ctx, depth),
            Err(payload) => {
                let error = RenderError::Panicked(panic_message(payload.as_ref()));
                self.capture(error, ctx, depth)
            }
        }
    }

    /// Clear the fault so the next render re-attempts the subtree.
    pub fn reset(&mut self) {
        self.state.has_error = false;
        self.state.error = None;
    }

    fn capture(&mut self, error: RenderError, ctx: &mut RenderCtx, depth: usize) -> View {
        // The stack still holds the failing path; harvest it before
        // truncating back to this boundary's frame.
        let context = ErrorContext::new(ctx.component_stack());
        ctx.truncate(depth);

        tracing::error!(
            component_stack = %context.component_stack,
            "Error Boundary caught an error: {}",
            error.message()
        );

        if let Some(observer) = self.observer.as_mut() {
            if trap(|| observer(&error, &context)).is_err() {
                tracing::warn!("error observer panicked during capture");
            }
        }

        self.state.has_error = true;
        self.state.error = Some(error);
        self.fallback_view()
    }

    fn fallback_view(&self) -> View {
        let reset = self.reset_action.as_deref();
        match &self.fallback {
            Fallback::Default => render_default_fallback(self.state.error.as_ref(), reset),
            Fallback::View(view) => view.clone(),
            Fallback::Func(render) => match self.state.error.as_ref() {
                Some(error) => render(error),
                None => render_default_fallback(None, reset),
            },
        }
    }
}

impl Default for ErrorBoundary {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ErrorBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("children", &self.children.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// PANIC TRAP
// =============================================================================

thread_local! {
    static TRAP_DEPTH: Cell<u32> = const { Cell::new(0) };
}

static TRAP_HOOK: Once = Once::new();

/// Install a panic hook that stays quiet for trapped panics.
///
/// Trapped panics are reported through the boundary's own log line; the
/// default hook would print a duplicate backtrace for each one. Panics
/// outside any trap are forwarded to the previously installed hook
/// unchanged.
fn install_trap_hook() {
    TRAP_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if TRAP_DEPTH.with(Cell::get) == 0 {
                previous(info);
            }
        }));
    });
}

/// Run `f`, converting a panic into an `Err` carrying its payload.
fn trap<R>(f: impl FnOnce() -> R) -> Result<R, Box<dyn std::any::Any + Send>> {
    install_trap_hook();
    TRAP_DEPTH.with(|depth| depth.set(depth.get().saturating_add(1)));
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    TRAP_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    outcome
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::component::{Component, RenderResult};
    use crate::view::el;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    struct Failing(&'static str);

    impl Component for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
            Err(RenderError::failed(self.0))
        }
    }

    struct Panicking;

    impl Component for Panicking {
        fn name(&self) -> &str {
            "Panicking"
        }

        fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
            panic!("ledger index out of bounds");
        }
    }

    /// Fails on the first render, succeeds afterwards.
    struct FailOnce {
        failed: Arc<AtomicBool>,
    }

    impl Component for FailOnce {
        fn name(&self) -> &str {
            "FailOnce"
        }

        fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
            if self.failed.swap(true, Ordering::SeqCst) {
                Ok(View::text("recovered"))
            } else {
                Err(RenderError::failed("transient"))
            }
        }
    }

    /// Counts render attempts and always fails.
    struct CountedFailure {
        attempts: Arc<AtomicU32>,
    }

    impl Component for CountedFailure {
        fn name(&self) -> &str {
            "CountedFailure"
        }

        fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(RenderError::failed("persistent"))
        }
    }

    #[test]
    fn healthy_boundary_is_transparent() {
        let child: View = el("section").class("summary").text("net worth").into();
        let mut boundary = ErrorBoundary::new().with_child(child.clone());
        let mut ctx = RenderCtx::new();
        assert_eq!(boundary.render(&mut ctx), child);
        assert!(!boundary.is_faulted());
        assert!(boundary.captured_error().is_none());
    }

    #[test]
    fn explicit_failure_is_captured() {
        let mut boundary = ErrorBoundary::new().with_child(Child::component(Failing("no data")));
        let mut ctx = RenderCtx::new();
        let view = boundary.render(&mut ctx);

        assert!(boundary.is_faulted());
        assert_eq!(boundary.captured_error().map(RenderError::message), Some("no data"));
        let html = view.to_html();
        assert!(html.contains("Something went wrong"));
        assert!(html.contains("no data"));
    }

    #[test]
    fn panic_is_captured_with_payload_message() {
        let mut boundary = ErrorBoundary::new().with_child(Child::component(Panicking));
        let mut ctx = RenderCtx::new();
        let view = boundary.render(&mut ctx);

        assert!(boundary.is_faulted());
        assert_eq!(
            boundary.captured_error(),
            Some(&RenderError::Panicked("ledger index out of bounds".into()))
        );
        assert!(view.to_html().contains("ledger index out of bounds"));
    }

    #[test]
    fn capture_leaves_the_context_stack_balanced() {
        let mut boundary = ErrorBoundary::new().with_child(Child::component(Failing("x")));
        let mut ctx = RenderCtx::new();
        boundary.render(&mut ctx);
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn fault_does_not_disturb_siblings() {
        let mut outer = ErrorBoundary::new()
            .with_child(ErrorBoundary::new().with_child(Child::component(Failing("left"))))
            .with_child(ErrorBoundary::new().with_child("right pane"));
        let mut ctx = RenderCtx::new();
        let view = outer.render(&mut ctx);

        assert!(!outer.is_faulted());
        let html = view.to_html();
        assert!(html.contains("Something went wrong"));
        assert!(html.contains("right pane"));
    }

    #[test]
    fn innermost_boundary_wins_regardless_of_nesting_depth() {
        let captured = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&captured);
        let inner = ErrorBoundary::new()
            .with_observer(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .with_child(Child::component(Failing("deep")));
        let mid = ErrorBoundary::new().with_child(inner);
        let mut outer = ErrorBoundary::new().with_child(mid);

        let mut ctx = RenderCtx::new();
        let view = outer.render(&mut ctx);

        assert!(!outer.is_faulted());
        assert_eq!(captured.load(Ordering::SeqCst), 1);
        assert!(view.to_html().contains("Something went wrong"));
    }

    #[test]
    fn faulted_boundary_skips_its_subtree() {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut boundary = ErrorBoundary::new().with_child(Child::component(CountedFailure {
            attempts: Arc::clone(&attempts),
        }));
        let mut ctx = RenderCtx::new();

        boundary.render(&mut ctx);
        boundary.render(&mut ctx);
        boundary.render(&mut ctx);

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(boundary.is_faulted());
    }

    #[test]
    fn reset_is_the_only_way_back_to_healthy() {
        let failed = Arc::new(AtomicBool::new(false));
        let mut boundary = ErrorBoundary::new().with_child(Child::component(FailOnce {
            failed: Arc::clone(&failed),
        }));
        let mut ctx = RenderCtx::new();

        boundary.render(&mut ctx);
        assert!(boundary.is_faulted());

        // Re-rendering alone must not clear the fault.
        boundary.render(&mut ctx);
        assert!(boundary.is_faulted());

        boundary.reset();
        assert!(!boundary.is_faulted());
        assert!(boundary.captured_error().is_none());

        let view = boundary.render(&mut ctx);
        assert_eq!(view, View::text("recovered"));
        assert!(!boundary.is_faulted());
    }

    #[test]
    fn observer_sees_error_and_component_stack() {
        let stacks = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&stacks);
        let mut boundary = ErrorBoundary::new()
            .with_observer(move |error, context| {
                sink.lock()
                    .unwrap()
                    .push((error.message().to_owned(), context.component_stack.clone()));
            })
            .with_child(Child::component(Failing("observer test")));

        let mut ctx = RenderCtx::new();
        boundary.render(&mut ctx);

        let seen = stacks.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "observer test");
        assert!(seen[0].1.contains("    at Failing"));
    }

    #[test]
    fn panicking_observer_does_not_break_capture() {
        let mut boundary = ErrorBoundary::new()
            .with_observer(|_, _| panic!("observer bug"))
            .with_child(Child::component(Failing("primary fault")));
        let mut ctx = RenderCtx::new();
        let view = boundary.render(&mut ctx);

        assert!(boundary.is_faulted());
        assert_eq!(
            boundary.captured_error().map(RenderError::message),
            Some("primary fault")
        );
        assert!(view.to_html().contains("primary fault"));
    }

    #[test]
    fn reset_action_renders_a_try_again_form() {
        let mut boundary = ErrorBoundary::new()
            .with_reset_action("/pages/dashboard/reset")
            .with_child(Child::component(Failing("feed stalled")));
        let mut ctx = RenderCtx::new();
        let html = boundary.render(&mut ctx).to_html();

        assert!(html.contains(r#"<form method="post" action="/pages/dashboard/reset">"#));
        assert!(html.contains("Try again"));
    }

    #[test]
    fn fallback_omits_try_again_without_a_reset_action() {
        let mut boundary = ErrorBoundary::new().with_child(Child::component(Failing("x")));
        let mut ctx = RenderCtx::new();
        let html = boundary.render(&mut ctx).to_html();

        assert!(!html.contains("Try again"));
        assert!(html.contains("Go to Dashboard"));
    }

    #[test]
    fn custom_static_fallback_replaces_the_default() {
        let custom: View = el("p").class("oops").text("custom fallback").into();
        let mut boundary = ErrorBoundary::new()
            .with_fallback(Fallback::View(custom.clone()))
            .with_child(Child::component(Failing("x")));
        let mut ctx = RenderCtx::new();

        assert_eq!(boundary.render(&mut ctx), custom);
    }

    #[test]
    fn derived_fallback_sees_the_captured_error() {
        let mut boundary = ErrorBoundary::new()
            .with_fallback(Fallback::func(|error| {
                View::text(format!("fault: {}", error.message()))
            }))
            .with_child(Child::component(Failing("amount overflow")));
        let mut ctx = RenderCtx::new();

        assert_eq!(
            boundary.render(&mut ctx),
            View::text("fault: amount overflow")
        );
    }

    #[test]
    fn state_invariant_holds_across_transitions() {
        let mut boundary = ErrorBoundary::new().with_child(Child::component(Failing("x")));
        let mut ctx = RenderCtx::new();

        let state = boundary.state();
        assert_eq!(state.has_error(), state.error().is_some());

        boundary.render(&mut ctx);
        let state = boundary.state();
        assert_eq!(state.has_error(), state.error().is_some());
        assert!(state.has_error());

        boundary.reset();
        let state = boundary.state();
        assert_eq!(state.has_error(), state.error().is_some());
        assert!(!state.has_error());
    }

    #[test]
    fn set_children_does_not_clear_a_fault() {
        let mut boundary = ErrorBoundary::new().with_child(Child::component(Failing("x")));
        let mut ctx = RenderCtx::new();
        boundary.render(&mut ctx);
        assert!(boundary.is_faulted());

        boundary.set_children(vec![Child::from("fresh content")]);
        boundary.render(&mut ctx);
        assert!(boundary.is_faulted());

        boundary.reset();
        let view = boundary.render(&mut ctx);
        assert_eq!(view, View::text("fresh content"));
    }
}
