//! Page templates
//!
//! Handlebars templates are compiled into the binary and registered once at
//! startup. Pages share the `layout` partial.

use crate::error::AppError;
use anyhow::anyhow;
use axum::response::Html;
use handlebars::Handlebars;
use serde::Serialize;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout", include_str!("../templates/layout.hbs")),
    ("login", include_str!("../templates/login.hbs")),
    ("dashboard", include_str!("../templates/dashboard.hbs")),
    ("editor", include_str!("../templates/editor.hbs")),
];

/// Registered page templates
#[derive(Debug)]
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    /// Compile every page template
    pub fn new() -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        for (name, source) in TEMPLATES {
            registry
                .register_template_string(name, source)
                .map_err(|e| AppError::Internal(anyhow!("Template {} failed to compile: {}", name, e)))?;
        }
        Ok(Self { registry })
    }

    /// Render a page
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<Html<String>, AppError> {
        self.registry.render(name, context).map(Html).map_err(|e| {
            tracing::error!(template = %name, error = %e, "Template rendering error");
            AppError::from(e)
        })
    }
}
