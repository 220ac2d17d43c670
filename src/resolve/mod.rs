//! Module resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Route definition (component / handler identifier strings)
//!     → ModuleResolver (injected capability)
//!     → Component / Handler trait objects
//! ```
//!
//! # Design Decisions
//! - Modules are resolved by string identifier through an injected trait,
//!   keeping the engine testable against an in-memory registry
//! - Components render synchronously; resolution is the asynchronous part
//! - Handlers mutate the shared context in place; return values carry only
//!   success or failure

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::render::context::RenderContext;

/// A resolved UI component.
pub type ComponentRef = Arc<dyn Component>;

/// A resolved server handler.
pub type HandlerRef = Arc<dyn Handler>;

/// Error raised when a declared module cannot be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown component module '{0}'")]
    UnknownComponent(String),

    #[error("unknown handler module '{0}'")]
    UnknownHandler(String),

    /// The resolver located the module but failed to load it.
    #[error("failed to load module '{id}': {source}")]
    Load {
        id: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Error raised by a handler invocation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl HandlerError {
    /// A handler failure described by a message alone.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error.
    pub fn wrap(source: impl Error + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

/// A UI component: wraps an already-rendered child into its own markup.
///
/// Components are pure with respect to the context; they read it, never
/// mutate it.
pub trait Component: Send + Sync {
    /// Render this component around `child`, with the shared context in view.
    fn render(&self, ctx: &RenderContext, child: &str) -> String;
}

/// A server handler: mutates the per-request context before rendering.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Apply this handler's side effects to the context.
    async fn handle(&self, ctx: &mut RenderContext) -> Result<(), HandlerError>;

    /// Transform the context before it is serialized into the page.
    ///
    /// Invoked at the serialization stage, after `request` and template meta
    /// have been stripped. The default does nothing.
    fn serialize(&self, ctx: &mut RenderContext) {
        let _ = ctx;
    }
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Component")
    }
}

impl std::fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Handler")
    }
}

/// Resolves module identifiers to loaded modules.
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    async fn component(&self, id: &str) -> Result<ComponentRef, ResolveError>;
    async fn handler(&self, id: &str) -> Result<HandlerRef, ResolveError>;
}

/// Pass-through component substituted where a route declares none.
pub struct IdentityComponent;

impl Component for IdentityComponent {
    fn render(&self, _ctx: &RenderContext, child: &str) -> String {
        child.to_string()
    }
}

/// Component built from a plain function.
pub struct FnComponent<F>(pub F);

impl<F> Component for FnComponent<F>
where
    F: Fn(&RenderContext, &str) -> String + Send + Sync,
{
    fn render(&self, ctx: &RenderContext, child: &str) -> String {
        (self.0)(ctx, child)
    }
}

/// In-memory module registry.
///
/// The embedding application registers its components and handlers by
/// identifier at startup; the registry is immutable once shared.
#[derive(Default)]
pub struct ModuleRegistry {
    components: HashMap<String, ComponentRef>,
    handlers: HashMap<String, HandlerRef>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_component(
        &mut self,
        id: impl Into<String>,
        component: impl Component + 'static,
    ) -> &mut Self {
        self.components.insert(id.into(), Arc::new(component));
        self
    }

    pub fn register_handler(
        &mut self,
        id: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> &mut Self {
        self.handlers.insert(id.into(), Arc::new(handler));
        self
    }
}

#[async_trait]
impl ModuleResolver for ModuleRegistry {
    async fn component(&self, id: &str) -> Result<ComponentRef, ResolveError> {
        self.components
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownComponent(id.to_string()))
    }

    async fn handler(&self, id: &str) -> Result<HandlerRef, ResolveError> {
        self.handlers
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownHandler(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_resolves_registered_component() {
        let mut registry = ModuleRegistry::new();
        registry.register_component("page", FnComponent(|_: &RenderContext, child: &str| {
            format!("<main>{child}</main>")
        }));

        let component = registry.component("page").await.unwrap();
        let ctx = RenderContext::new();
        assert_eq!(component.render(&ctx, "x"), "<main>x</main>");
    }

    #[tokio::test]
    async fn test_registry_unknown_module() {
        let registry = ModuleRegistry::new();
        let err = registry.component("missing").await.unwrap_err();
        assert!(matches!(err, ResolveError::UnknownComponent(_)));

        let err = registry.handler("missing").await.unwrap_err();
        assert!(matches!(err, ResolveError::UnknownHandler(_)));
    }

    #[test]
    fn test_identity_component_passes_child_through() {
        let ctx = RenderContext::new();
        assert_eq!(IdentityComponent.render(&ctx, "<p>inner</p>"), "<p>inner</p>");
    }
}
