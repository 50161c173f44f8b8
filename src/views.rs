use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

use crate::errors::{AppError, Result};

/// HTML page templates, compiled into the binary
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();

        for (name, source) in [
            ("base.html", include_str!("../templates/base.html")),
            ("index.html", include_str!("../templates/index.html")),
            ("chat.html", include_str!("../templates/chat.html")),
            ("summary.html", include_str!("../templates/summary.html")),
            ("flashcards.html", include_str!("../templates/flashcards.html")),
        ] {
            env.add_template(name, source)
                .map_err(|e| AppError::Internal(format!("Invalid template {}: {}", name, e)))?;
        }

        Ok(Self { env })
    }

    /// Render a template; `.html` templates auto-escape everything not marked `safe`
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<Html<String>> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| AppError::Internal(format!("Unknown template {}: {}", name, e)))?;

        template
            .render(context)
            .map(Html)
            .map_err(|e| AppError::Internal(format!("Failed to render {}: {:#}", name, e)))
    }
}
