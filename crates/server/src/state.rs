use std::sync::Arc;

use tera::Tera;

use folio_agent::PortfolioGenerator;
use folio_db::PortfolioStore;

use crate::auth::AuthGateway;
use crate::session::CookieSettings;

/// Shared handles for every route. Cloned per request; all members are cheap
/// reference-counted handles.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthGateway,
    pub store: PortfolioStore,
    pub generator: PortfolioGenerator,
    pub templates: Arc<Tera>,
    pub cookies: CookieSettings,
}

const TEMPLATES: [(&str, &str); 6] = [
    ("base.html", include_str!("../../../templates/base.html")),
    ("home.html", include_str!("../../../templates/home.html")),
    ("login.html", include_str!("../../../templates/login.html")),
    ("dashboard.html", include_str!("../../../templates/dashboard.html")),
    ("generator.html", include_str!("../../../templates/generator.html")),
    ("portfolio.html", include_str!("../../../templates/portfolio.html")),
];

/// Compiles the embedded page templates.
pub fn init_templates() -> Result<Arc<Tera>, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES)?;
    Ok(Arc::new(tera))
}
