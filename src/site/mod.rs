//! # Site Model and Services
//!
//! Site records are immutable reference data: loaded from configuration at
//! startup (optionally merged with records fetched from the content API)
//! and matched against request hostnames by the [`resolver::SiteResolver`].

pub mod info;
pub mod redirects;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use self::info::SiteInfoService;
pub use self::redirects::{
    find_redirect, Redirect, RedirectType, RedirectsService, SiteRedirectsService,
};
pub use self::resolver::SiteResolver;

/// A configured site record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Site name in the content system
    pub name: String,

    /// Primary hostname, optionally a `*.domain` wildcard
    pub host_name: String,

    /// Default language for the site
    #[serde(default)]
    pub language: String,

    /// Content root path
    #[serde(default)]
    pub root_path: String,

    /// Backing database (e.g. master, web)
    #[serde(default)]
    pub database: String,
}

impl Site {
    /// Convenience constructor for a name + hostname record
    pub fn new(name: impl Into<String>, host_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_name: host_name.into(),
            ..Self::default()
        }
    }
}
