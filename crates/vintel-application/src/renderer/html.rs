//! HTML fragments rendered through minijinja.
//!
//! Templates are compiled into the binary and auto-escaped, so message text
//! from providers can never inject markup.

use minijinja::Environment;
use serde::Serialize;
use vintel_core::{Result, VintelError};

use super::view::{DashboardView, FeedView, InvestigationView};

const TEMPLATES: [(&str, &str); 4] = [
    ("notifications.html", include_str!("../../templates/notifications.html")),
    ("feed.html", include_str!("../../templates/feed.html")),
    ("dashboard.html", include_str!("../../templates/dashboard.html")),
    ("investigation.html", include_str!("../../templates/investigation.html")),
];

pub struct HtmlRenderer {
    env: Environment<'static>,
}

impl HtmlRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        for (name, source) in TEMPLATES {
            env.add_template(name, source).map_err(template_error)?;
        }
        Ok(Self { env })
    }

    pub fn render_feed(&self, view: &FeedView) -> Result<String> {
        self.render("feed.html", view)
    }

    pub fn render_dashboard(&self, view: &DashboardView) -> Result<String> {
        self.render("dashboard.html", view)
    }

    pub fn render_investigation(&self, view: &InvestigationView) -> Result<String> {
        self.render("investigation.html", view)
    }

    fn render<S: Serialize>(&self, name: &str, ctx: &S) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(template_error)
    }
}

fn template_error(err: minijinja::Error) -> VintelError {
    VintelError::internal(format!("template error: {}", err))
}
