//! Failure-handling options for narrative generation

/// Generator options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Convert render failures into the empty narrative instead of returning them
    pub ignore_failures: bool,

    /// Treat a profile without a template as "nothing to render" rather than a failure
    pub ignore_missing_templates: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            ignore_failures: true,
            ignore_missing_templates: true,
        }
    }
}

impl GeneratorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict configuration: every failure reaches the caller
    pub fn strict() -> Self {
        Self {
            ignore_failures: false,
            ignore_missing_templates: false,
        }
    }

    pub fn with_ignore_failures(mut self, ignore: bool) -> Self {
        self.ignore_failures = ignore;
        self
    }

    pub fn with_ignore_missing_templates(mut self, ignore: bool) -> Self {
        self.ignore_missing_templates = ignore;
        self
    }
}
