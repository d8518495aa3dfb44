use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

const HEADER_TEMPLATE: &str = "_header.html.liquid";
const FOOTER_TEMPLATE: &str = "_footer.html.liquid";

/// Liquid templates loaded from disk, reloaded when the file's mtime moves.
pub struct TemplateEngine {
    template_dir: PathBuf,
    site_name: String,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf, site_name: impl Into<String>) -> Self {
        Self {
            template_dir,
            site_name: site_name.into(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn load_template(&self, path: &str) -> Result<String, String> {
        let template_path = self.template_dir.join(path);

        let metadata = tokio::fs::metadata(&template_path)
            .await
            .map_err(|e| format!("Failed to get metadata for {}: {}", path, e))?;

        let modified = metadata
            .modified()
            .map_err(|e| format!("Failed to get modified time: {}", e))?;

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(path) {
            if cached.modified >= modified {
                debug!("Using cached template for {}", path);
                return Ok(cached.content.clone());
            }
        }

        info!("Loading template: {}", path);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| format!("Failed to read template {}: {}", path, e))?;

        cache.insert(
            path.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    fn render_source(source: &str, globals: &liquid::Object) -> Result<String, String> {
        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(|e| format!("Failed to create parser: {}", e))?;

        let template = parser
            .parse(source)
            .map_err(|e| format!("Failed to parse template: {}", e))?;

        template
            .render(globals)
            .map_err(|e| format!("Failed to render template: {}", e))
    }

    /// Renders a partial with the page globals. A missing or broken partial
    /// renders as empty so the page still comes up.
    async fn render_partial(&self, name: &str, globals: &liquid::Object) -> String {
        let source = match self.load_template(name).await {
            Ok(source) => source,
            Err(e) => {
                error!("Failed to load {}: {}", name, e);
                return String::new();
            }
        };

        Self::render_source(&source, globals).unwrap_or_else(|e| {
            error!("Failed to render {}: {}", name, e);
            String::new()
        })
    }

    pub async fn render_template(
        &self,
        template_name: &str,
        globals: liquid::Object,
    ) -> Result<String, String> {
        let template_content = self.load_template(template_name).await?;

        let mut full_globals = globals;
        if !full_globals.contains_key("site_name") {
            full_globals.insert(
                "site_name".into(),
                liquid::model::Value::Scalar(self.site_name.clone().into()),
            );
        }

        let header = self.render_partial(HEADER_TEMPLATE, &full_globals).await;
        let footer = self.render_partial(FOOTER_TEMPLATE, &full_globals).await;
        full_globals.insert("header".into(), liquid::model::Value::Scalar(header.into()));
        full_globals.insert("footer".into(), liquid::model::Value::Scalar(footer.into()));

        Self::render_source(&template_content, &full_globals)
    }

    /// `render_template` as an HTML response; failures become a bare 500.
    pub async fn render_page(&self, template_name: &str, globals: liquid::Object) -> Response {
        match self.render_template(template_name, globals).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!("Template rendering error for {}: {}", template_name, e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
