//! HTML templates used to render STAC responses.
//!
//! Templates are identified by their id, e.g. `items`, which maps to the `items.html` file.
//! A set of built-in templates is compiled into the binary, and individual templates
//! can be replaced by putting a file with the same name into a templates directory.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tera::{Context, Tera};
use tracing::{debug, info};

/// Built-in templates, in the order they are registered.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("header.html", include_str!("../templates/header.html")),
    ("footer.html", include_str!("../templates/footer.html")),
    ("links.html", include_str!("../templates/links.html")),
    ("features.html", include_str!("../templates/features.html")),
    ("landing.html", include_str!("../templates/landing.html")),
    ("conformances.html", include_str!("../templates/conformances.html")),
    ("collections.html", include_str!("../templates/collections.html")),
    ("collection.html", include_str!("../templates/collection.html")),
    ("items.html", include_str!("../templates/items.html")),
    ("item.html", include_str!("../templates/item.html")),
    ("search.html", include_str!("../templates/search.html")),
    ("queryables.html", include_str!("../templates/queryables.html")),
];

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("Unable to compile built-in templates: {0}")]
    BuiltinError(#[source] tera::Error),

    #[error("Templates directory {0} does not exist or is not a directory")]
    MissingDirectory(PathBuf),

    #[error("Unable to load templates from {1}: {0}")]
    LoadError(#[source] tera::Error, PathBuf),

    #[error("Template {0} is not defined")]
    UnknownTemplate(String),

    #[error("Template context must be a JSON object: {0}")]
    InvalidContext(#[source] tera::Error),

    #[error("Unable to render template {0}: {1}")]
    RenderError(String, #[source] tera::Error),
}

/// Renders a template, identified by its id, with an arbitrary JSON context.
pub trait TemplateRenderer: Debug + Send + Sync {
    fn render(&self, template_id: &str, context: &Value) -> TemplateResult<String>;

    fn has_template(&self, template_id: &str) -> bool;
}

/// [`TemplateRenderer`] backed by a [`Tera`] instance.
#[derive(Debug, Clone)]
pub struct TeraRenderer {
    tera: Tera,
}

fn template_file(template_id: &str) -> String {
    format!("{template_id}.html")
}

impl TeraRenderer {
    /// Create a renderer with the built-in templates only.
    pub fn new() -> TemplateResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())
            .map_err(TemplateError::BuiltinError)?;
        Ok(Self { tera })
    }

    /// Create a renderer where the `*.html` files of `dir` take precedence over the built-in templates.
    ///
    /// Templates in `dir` may extend or include any built-in template, e.g. `base.html`.
    pub fn with_directory(dir: &Path) -> TemplateResult<Self> {
        if !dir.is_dir() {
            return Err(TemplateError::MissingDirectory(dir.to_path_buf()));
        }
        let glob = dir.join("**").join("*.html");
        let mut tera = Tera::parse(&glob.to_string_lossy())
            .map_err(|e| TemplateError::LoadError(e, dir.to_path_buf()))?;
        let overrides = tera.get_template_names().count();

        let builtin = Self::new()?;
        tera.extend(&builtin.tera)
            .map_err(|e| TemplateError::LoadError(e, dir.to_path_buf()))?;

        info!(
            "Loaded {overrides} custom templates from {}",
            dir.display()
        );
        Ok(Self { tera })
    }

    /// Create a renderer from an optional templates directory.
    pub fn from_dir(dir: Option<&Path>) -> TemplateResult<Self> {
        match dir {
            Some(dir) => Self::with_directory(dir),
            None => Self::new(),
        }
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template_id: &str, context: &Value) -> TemplateResult<String> {
        let name = template_file(template_id);
        if !self.has_template(template_id) {
            return Err(TemplateError::UnknownTemplate(name));
        }
        let context = Context::from_value(context.clone()).map_err(TemplateError::InvalidContext)?;
        debug!("Rendering template {name}");
        self.tera
            .render(&name, &context)
            .map_err(|e| TemplateError::RenderError(name, e))
    }

    fn has_template(&self, template_id: &str) -> bool {
        let name = template_file(template_id);
        self.tera.get_template_names().any(|n| n == name)
    }
}
