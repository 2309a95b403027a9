//! Template renderer seam
//!
//! Rendering is an external collaborator invoked at confirm time. A failed
//! render leaves the commit Init so the caller can retry or cancel.

use async_trait::async_trait;
use thiserror::Error;

/// Renderer failure, surfaced verbatim to the confirm caller.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Result type for render operations
pub type Result<T> = std::result::Result<T, RenderError>;

/// Turns template sources into concrete content bytes.
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    /// Render an inline template with its render rule.
    async fn render_inline(&self, template: &str, rule: &str) -> Result<Vec<u8>>;

    /// Render a template managed by the external template service.
    async fn render_template(&self, template_id: &str) -> Result<Vec<u8>>;
}

/// Renderer for deployments without a template service: inline templates
/// pass through unrendered, template references fail.
pub struct PassthroughRenderer;

#[async_trait]
impl TemplateRenderer for PassthroughRenderer {
    async fn render_inline(&self, template: &str, _rule: &str) -> Result<Vec<u8>> {
        Ok(template.as_bytes().to_vec())
    }

    async fn render_template(&self, template_id: &str) -> Result<Vec<u8>> {
        Err(RenderError(format!(
            "no template service configured, cannot render {template_id}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_inline() {
        let rendered = PassthroughRenderer
            .render_inline("X={{v}}", "v=1")
            .await
            .unwrap();
        assert_eq!(rendered, b"X={{v}}");
    }

    #[tokio::test]
    async fn test_passthrough_rejects_template_refs() {
        assert!(PassthroughRenderer.render_template("tpl-1").await.is_err());
    }
}
