//! # Fallback Module
//!
//! Pure fallback renderers shown in place of a faulted subtree.
//!
//! Nothing here touches boundary state. Each renderer is a function
//! from the captured error (or its absence) to a [`View`]; the boundary
//! decides when to call it.
//!
//! Actions are plain markup. "Try again" only appears when the boundary
//! has a reset action wired up, and posts to that action; links navigate
//! outright. "Reload Page" is an empty-href anchor, which resolves to
//! the current URL.

use crate::component::RenderError;
use crate::view::{el, View};

// =============================================================================
// CONTRACT STRINGS
// =============================================================================

/// Heading shown above every fallback.
pub const FALLBACK_HEADING: &str = "Something went wrong";

/// Body text when no error detail is available.
pub const FALLBACK_UNKNOWN_ERROR: &str = "An unexpected error occurred.";

/// Body text of the route-level fallback.
///
/// Deliberately generic: route faults show no raw error detail.
pub const ROUTE_FALLBACK_MESSAGE: &str = "Unable to load this page";

/// Where "Go Back" points when no explicit back path is given.
pub const DEFAULT_BACK_PATH: &str = "/dashboard";

// =============================================================================
// FALLBACK SELECTION
// =============================================================================

/// What a boundary renders while faulted.
pub enum Fallback {
    /// The standard fallback card.
    Default,
    /// Fixed custom content, independent of the error.
    View(View),
    /// Content derived from the captured error.
    Func(Box<dyn Fn(&RenderError) -> View + Send>),
}

impl Fallback {
    /// Derive fallback content from the captured error.
    #[must_use]
    pub fn func(render: impl Fn(&RenderError) -> View + Send + 'static) -> Self {
        Fallback::Func(Box::new(render))
    }
}

impl Default for Fallback {
    fn default() -> Self {
        Fallback::Default
    }
}

impl std::fmt::Debug for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::Default => f.write_str("Default"),
            Fallback::View(_) => f.write_str("View(..)"),
            Fallback::Func(_) => f.write_str("Func(..)"),
        }
    }
}

// =============================================================================
// DEFAULT FALLBACK
// =============================================================================

/// Render the standard fallback card.
///
/// The error message is shown to the user verbatim; a missing error
/// falls back to [`FALLBACK_UNKNOWN_ERROR`]. `reset` is the path the
/// "Try again" form posts to; without one there is no retry control,
/// only the dashboard link.
#[must_use]
pub fn render_default_fallback(error: Option<&RenderError>, reset: Option<&str>) -> View {
    let message = error.map_or(FALLBACK_UNKNOWN_ERROR, RenderError::message);
    let mut actions = el("div").class("error-actions");
    if let Some(action) = reset {
        actions = actions.child(
            el("form")
                .attr("method", "post")
                .attr("action", action)
                .child(el("button").attr("type", "submit").text("Try again")),
        );
    }
    actions = actions.child(el("a").attr("href", "/").text("Go to Dashboard"));

    el("div")
        .class("error-boundary")
        .child(el("h2").text(FALLBACK_HEADING))
        .child(el("p").class("error-message").text(message))
        .child(actions)
        .into()
}

// =============================================================================
// ROUTE FALLBACK
// =============================================================================

/// Route-level fallback: a whole page failed to load.
///
/// Shows a generic message instead of error detail, and navigation
/// actions instead of an in-place retry. The back link is optional;
/// enabling it without a path points at [`DEFAULT_BACK_PATH`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFallback {
    back_path: Option<String>,
}

impl RouteFallback {
    /// Route fallback without a back link.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a "Go Back" link to the default back path.
    #[must_use]
    pub fn with_back_button(mut self) -> Self {
        self.back_path = Some(DEFAULT_BACK_PATH.to_owned());
        self
    }

    /// Add a "Go Back" link to a specific path.
    #[must_use]
    pub fn with_back_path(mut self, path: impl Into<String>) -> Self {
        self.back_path = Some(path.into());
        self
    }

    /// Render the route fallback page body.
    #[must_use]
    pub fn render(&self) -> View {
        let mut actions = el("div").class("error-actions");
        if let Some(back) = &self.back_path {
            actions = actions.child(el("a").attr("href", back).text("Go Back"));
        }
        actions = actions
            .child(el("a").attr("href", "/").text("Go to Dashboard"))
            .child(el("a").attr("href", "").text("Reload Page"));

        el("div")
            .class("error-boundary error-boundary-route")
            .child(el("h2").text(FALLBACK_HEADING))
            .child(el("p").class("error-message").text(ROUTE_FALLBACK_MESSAGE))
            .child(actions)
            .into()
    }

    /// Use this route fallback for a boundary.
    #[must_use]
    pub fn into_fallback(self) -> Fallback {
        Fallback::func(move |_error| self.render())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::ErrorBoundary;
    use crate::component::{Child, Component, RenderCtx, RenderResult};

    #[test]
    fn default_fallback_shows_error_verbatim() {
        let error = RenderError::failed("account 7 not found");
        let html = render_default_fallback(Some(&error), Some("/pages/accounts/reset")).to_html();
        assert!(html.contains("Something went wrong"));
        assert!(html.contains("account 7 not found"));
        assert!(html.contains(r#"<form method="post" action="/pages/accounts/reset">"#));
        assert!(html.contains("Try again"));
        assert!(html.contains(r#"<a href="/">Go to Dashboard</a>"#));
    }

    #[test]
    fn default_fallback_handles_missing_error() {
        let html = render_default_fallback(None, None).to_html();
        assert!(html.contains("An unexpected error occurred."));
    }

    #[test]
    fn try_again_is_absent_without_a_reset_action() {
        let html = render_default_fallback(None, None).to_html();
        assert!(!html.contains("Try again"));
        assert!(html.contains(r#"<a href="/">Go to Dashboard</a>"#));
    }

    #[test]
    fn error_message_markup_is_escaped() {
        let error = RenderError::failed("<script>alert(1)</script>");
        let html = render_default_fallback(Some(&error), None).to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn route_fallback_has_no_back_link_by_default() {
        let html = RouteFallback::new().render().to_html();
        assert!(!html.contains("Go Back"));
        assert!(html.contains("Unable to load this page"));
        assert!(html.contains("Go to Dashboard"));
        assert!(html.contains("Reload Page"));
    }

    #[test]
    fn route_fallback_back_link_defaults_to_dashboard() {
        let html = RouteFallback::new().with_back_button().render().to_html();
        assert!(html.contains(r#"<a href="/dashboard">Go Back</a>"#));
    }

    #[test]
    fn route_fallback_back_path_is_configurable() {
        let html = RouteFallback::new()
            .with_back_path("/transactions")
            .render()
            .to_html();
        assert!(html.contains(r#"<a href="/transactions">Go Back</a>"#));
    }

    #[test]
    fn route_fallback_plugs_into_a_boundary() {
        struct Broken;
        impl Component for Broken {
            fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
                Err(RenderError::failed("route data fetch failed"))
            }
        }

        let mut boundary = ErrorBoundary::new()
            .with_fallback(RouteFallback::new().with_back_button().into_fallback())
            .with_child(Child::component(Broken));
        let mut ctx = RenderCtx::new();
        let html = boundary.render(&mut ctx).to_html();

        assert!(html.contains("Unable to load this page"));
        // Route faults never leak raw error detail.
        assert!(!html.contains("route data fetch failed"));
        assert!(html.contains("Go Back"));
    }
}
