//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::{Route, RouteBuilder};
use crate::screen::NamedScreen;

/// Root configuration for a router.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Defaults applied to every transition request.
    pub transitions: TransitionConfig,

    /// Route declarations, registered in order. Each path may appear once;
    /// validation rejects duplicates.
    pub routes: Vec<RouteConfig>,
}

impl RouterConfig {
    /// Register every declared route on `builder`.
    pub fn register_into(&self, builder: &mut RouteBuilder<'_>) {
        for route in &self.routes {
            builder.add(
                &route.path,
                Route::new(NamedScreen::new(route.screen.clone())).animated(route.animated),
            );
        }
    }
}

/// Transition defaults.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransitionConfig {
    /// Default for `Attributes::animated`.
    pub animated: bool,

    /// Default for `Attributes::should_queue`.
    pub queue: bool,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            animated: true,
            queue: false,
        }
    }
}

/// One declared route.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Path pattern, e.g. "/list/:id".
    pub path: String,

    /// Screen name handed to the updater.
    pub screen: String,

    /// Set to false for routes that must never animate.
    #[serde(default = "default_animated")]
    pub animated: bool,
}

fn default_animated() -> bool {
    true
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when RUST_LOG is unset (trace, debug, info, warn, error,
    /// or a full EnvFilter directive).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav_url::NavUrl;
    use crate::routing::RouteTree;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: RouterConfig = toml::from_str("").unwrap();
        assert_eq!(config, RouterConfig::default());
        assert!(config.transitions.animated);
        assert!(!config.transitions.queue);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_register_into() {
        let config: RouterConfig = toml::from_str(
            r#"
            [[routes]]
            path = "/home"
            screen = "Home"

            [[routes]]
            path = "/sheet"
            screen = "Sheet"
            animated = false
            "#,
        )
        .unwrap();

        let tree = RouteTree::build(|r| config.register_into(r)).unwrap();
        assert!(tree.get("/home").unwrap().animated());
        assert!(!tree.get("/sheet").unwrap().animated());
        assert!(tree.resolve(&NavUrl::parse("/sheet")).is_ok());
    }
}
