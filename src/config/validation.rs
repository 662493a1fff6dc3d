//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route patterns parse
//! - Detect duplicate route paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::routing::tree::parse_pattern;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{index}: path is empty")]
    EmptyPath { index: usize },

    #[error("route #{index}: {reason}")]
    InvalidPattern { index: usize, reason: String },

    #[error("route #{index} ({path}): screen name is empty")]
    EmptyScreen { index: usize, path: String },

    #[error("route #{index} ({path}): duplicates route #{first}")]
    DuplicatePath {
        index: usize,
        first: usize,
        path: String,
    },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen: HashMap<Vec<crate::routing::Segment>, usize> = HashMap::new();

    for (index, route) in config.routes.iter().enumerate() {
        if route.path.trim().is_empty() {
            errors.push(ValidationError::EmptyPath { index });
            continue;
        }

        match parse_pattern(&route.path) {
            Ok(segments) => {
                if let Some(first) = seen.get(&segments) {
                    errors.push(ValidationError::DuplicatePath {
                        index,
                        first: *first,
                        path: route.path.clone(),
                    });
                } else {
                    seen.insert(segments, index);
                }
            }
            Err(e) => errors.push(ValidationError::InvalidPattern {
                index,
                reason: e.to_string(),
            }),
        }

        if route.screen.trim().is_empty() {
            errors.push(ValidationError::EmptyScreen {
                index,
                path: route.path.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
