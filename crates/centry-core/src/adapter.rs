//! # Adapter Module
//!
//! Wraps any component in its own error boundary.
//!
//! The adapter is the convenience path: instead of building a boundary
//! and pushing the component as its child, call [`with_error_boundary`]
//! and get back a component that renders the same content but contains
//! its own faults. Wrappers compose like any other component, so a
//! wrapped widget can sit inside a page that is itself wrapped.

use crate::boundary::ErrorBoundary;
use crate::component::{Child, Component, ErrorContext, RenderCtx, RenderError, RenderResult};
use crate::fallback::Fallback;

/// Wrap a component in a dedicated error boundary.
///
/// The wrapper's diagnostic name is derived from the inner component:
/// `withErrorBoundary(<inner name>)`, falling back to the literal
/// `Component` for components that expose no name of their own.
#[must_use]
pub fn with_error_boundary(component: impl Component + Send + 'static) -> WithErrorBoundary {
    let name = format!("withErrorBoundary({})", component.name());
    WithErrorBoundary {
        name,
        boundary: ErrorBoundary::new().with_child(Child::component(component)),
    }
}

/// A component wrapped in its own boundary.
///
/// Renders the inner component while healthy and that boundary's
/// fallback while faulted; never fails itself.
pub struct WithErrorBoundary {
    name: String,
    boundary: ErrorBoundary,
}

impl WithErrorBoundary {
    /// Use a custom fallback instead of the default card.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.boundary.set_fallback(fallback);
        self
    }

    /// Register a capture observer on the wrapping boundary.
    #[must_use]
    pub fn with_observer(
        mut self,
        observer: impl FnMut(&RenderError, &ErrorContext) + Send + 'static,
    ) -> Self {
        self.boundary = self.boundary.with_observer(observer);
        self
    }

    /// Whether the wrapped component is currently faulted.
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        self.boundary.is_faulted()
    }

    /// Clear the fault so the next render re-attempts the component.
    pub fn reset(&mut self) {
        self.boundary.reset();
    }

    /// The underlying boundary.
    #[must_use]
    pub fn boundary(&self) -> &ErrorBoundary {
        &self.boundary
    }

    /// Mutable access to the underlying boundary.
    pub fn boundary_mut(&mut self) -> &mut ErrorBoundary {
        &mut self.boundary
    }
}

impl Component for WithErrorBoundary {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&mut self, ctx: &mut RenderCtx) -> RenderResult {
        Ok(self.boundary.render(ctx))
    }
}

impl std::fmt::Debug for WithErrorBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WithErrorBoundary")
            .field("name", &self.name)
            .field("boundary", &self.boundary)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
