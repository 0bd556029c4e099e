//! Pre-filter deciding whether a workflow should run at all on the current
//! machine. Evaluated once by the engine front door, before scheduling.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Platform applicability metadata attached to a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicability {
    /// Required. Case-insensitive substring match against the platform
    /// family ("windows", "linux", "macos"). Empty never matches.
    pub os_family: String,
    /// Inclusive dotted-numeric lower bound. Absent or unparseable means
    /// no lower constraint.
    #[serde(default)]
    pub min_version: Option<String>,
    /// Inclusive dotted-numeric upper bound. Absent or unparseable means
    /// no upper constraint.
    #[serde(default)]
    pub max_version: Option<String>,
    /// Advisory: a mismatch is logged but does not exclude the workflow.
    #[serde(default)]
    pub product: Option<String>,
}

impl Applicability {
    pub fn for_family(os_family: impl Into<String>) -> Self {
        Self {
            os_family: os_family.into(),
            min_version: None,
            max_version: None,
            product: None,
        }
    }

    /// Whether a workflow carrying this metadata should run on `platform`.
    pub fn applies_to(&self, platform: &Platform) -> bool {
        if self.os_family.is_empty() {
            return false;
        }
        let family = platform.family.to_lowercase();
        let wanted = self.os_family.to_lowercase();
        if !family.contains(&wanted) && !wanted.contains(&family) {
            return false;
        }

        // Version bounds only constrain when both the bound and the
        // platform version parse; open otherwise.
        if let Some(current) = platform.version.as_deref().and_then(parse_version) {
            if let Some(min) = self.min_version.as_deref().and_then(parse_version) {
                if current < min {
                    return false;
                }
            }
            if let Some(max) = self.max_version.as_deref().and_then(parse_version) {
                if current > max {
                    return false;
                }
            }
        }

        // Product matching is presently advisory rather than enforced.
        if let (Some(wanted), Some(actual)) = (&self.product, &platform.product) {
            if !actual.to_lowercase().contains(&wanted.to_lowercase()) {
                warn!(
                    wanted = %wanted,
                    actual = %actual,
                    "Workflow product does not match platform product (advisory only)"
                );
            }
        }

        true
    }
}

/// The machine being audited, as the applicability evaluator sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub family: String,
    pub version: Option<String>,
    pub product: Option<String>,
}

impl Platform {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            version: None,
            product: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    /// Best-effort detection of the current platform. Family comes from
    /// the compile target; version and product are unknown here and left
    /// open, so version bounds do not constrain unless the caller fills
    /// them in from a richer source.
    pub fn detect() -> Self {
        Self {
            family: std::env::consts::OS.to_string(),
            version: None,
            product: None,
        }
    }
}

/// Parse a dotted-numeric version ("10.0.19045") into comparable parts.
/// Any non-numeric component makes the whole string unparseable.
fn parse_version(text: &str) -> Option<Vec<u64>> {
    text.trim()
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_matches_case_insensitively() {
        let app = Applicability::for_family("Windows");
        assert!(app.applies_to(&Platform::new("windows")));
        assert!(!app.applies_to(&Platform::new("linux")));
    }

    #[test]
    fn empty_family_never_matches() {
        let app = Applicability::for_family("");
        assert!(!app.applies_to(&Platform::new("windows")));
    }

    #[test]
    fn version_bounds_are_inclusive() {
        let mut app = Applicability::for_family("linux");
        app.min_version = Some("5.10".into());
        app.max_version = Some("6.2".into());

        assert!(app.applies_to(&Platform::new("linux").with_version("5.10")));
        assert!(app.applies_to(&Platform::new("linux").with_version("6.2")));
        assert!(app.applies_to(&Platform::new("linux").with_version("5.15.3")));
        assert!(!app.applies_to(&Platform::new("linux").with_version("5.4")));
        assert!(!app.applies_to(&Platform::new("linux").with_version("6.3")));
    }

    #[test]
    fn unparseable_bound_is_open() {
        let mut app = Applicability::for_family("linux");
        app.min_version = Some("rolling".into());
        assert!(app.applies_to(&Platform::new("linux").with_version("1.0")));
    }

    #[test]
    fn unknown_platform_version_ignores_bounds() {
        let mut app = Applicability::for_family("linux");
        app.min_version = Some("99.0".into());
        assert!(app.applies_to(&Platform::new("linux")));
    }

    #[test]
    fn product_mismatch_is_advisory() {
        let mut app = Applicability::for_family("windows");
        app.product = Some("server".into());
        let platform = Platform::new("windows").with_product("Workstation");
        assert!(app.applies_to(&platform));
    }

    #[test]
    fn version_parsing() {
        assert_eq!(parse_version("10.0.19045"), Some(vec![10, 0, 19045]));
        assert_eq!(parse_version("22h2"), None);
        assert!(parse_version("6.2") < parse_version("6.10"));
    }
}
