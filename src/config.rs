//! Client configuration and the embedded API route table.

use once_cell::sync::Lazy;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub(crate) struct Routes {
    pub account: AccountRoutes,
    pub widget: WidgetRoutes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountRoutes {
    pub signup: String,
    pub login: String,
    pub logout: String,
    pub data: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WidgetRoutes {
    pub embed: String,
}

static ROUTES: Lazy<Routes> = Lazy::new(|| {
    toml::from_str(include_str!("endpoints.toml")).expect("embedded endpoints.toml is valid")
});

pub(crate) fn routes() -> &'static Routes {
    &ROUTES
}

/// Per-client configuration.
///
/// The publishable `app_key` is non-secret display-routing information: it
/// scopes widget embeds to an application and travels as a plain query
/// parameter. Sessions are never configured here; they live entirely in the
/// browser-managed cookie.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub app_key: String,
    pub api_base: Url,
    pub widget_base: Url,
}

impl ClientConfig {
    /// Build a config. Base URLs are normalized to end with a slash so that
    /// joining route paths onto them is well-defined.
    pub fn new(app_key: impl Into<String>, api_base: Url, widget_base: Url) -> Self {
        Self {
            app_key: app_key.into(),
            api_base: with_trailing_slash(api_base),
            widget_base: with_trailing_slash(widget_base),
        }
    }

    pub(crate) fn api_endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.api_base.join(path)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
