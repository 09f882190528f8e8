//! JSON rendering of drip plans.
//!
//! # Example
//!
//! ```rust
//! use drip_core::Inventory;
//! use drip_report::{json::JsonRenderer, DripPlan};
//!
//! let plan = DripPlan::build("42", &Inventory::default(), &[]);
//! let renderer = JsonRenderer::new(&plan);
//!
//! let compact = renderer.render().unwrap();
//! assert!(!compact.contains('\n'));
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::{DripPlan, ReportError, Result};

/// Serializes a [`DripPlan`] to JSON.
pub struct JsonRenderer<'a> {
    plan: &'a DripPlan,
}

impl<'a> JsonRenderer<'a> {
    /// Creates a renderer for the given plan.
    #[must_use]
    pub const fn new(plan: &'a DripPlan) -> Self {
        Self { plan }
    }

    /// Renders compact single-line JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails.
    pub fn render(&self) -> Result<String> {
        serde_json::to_string(self.plan).map_err(ReportError::from)
    }

    /// Renders pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails.
    pub fn render_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self.plan).map_err(ReportError::from)
    }

    /// Writes the plan to `path`, creating or overwriting the file.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails and
    /// [`ReportError::Io`] if the file cannot be written.
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.render_pretty()?
        } else {
            self.render()?
        };

        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures::{chain, inventory};
    use crate::Diagnostic;

    fn sample_plan() -> DripPlan {
        DripPlan::build(
            "42",
            &inventory(),
            &[chain("drip-1", &["101", "102"]), chain("drip-2", &[])],
        )
    }

    #[test]
    fn test_pretty_output_parses_back() {
        let plan = sample_plan();

        let json = JsonRenderer::new(&plan).render_pretty().unwrap();

        assert!(json.contains('\n'));
        let parsed: DripPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, plan);
    }

    #[test]
    fn test_json_field_layout() {
        let plan = sample_plan();

        let value: serde_json::Value =
            serde_json::from_str(&JsonRenderer::new(&plan).render().unwrap()).unwrap();

        assert_eq!(value["course_id"], "42");
        assert_eq!(value["summary"]["chains"], 2);
        assert_eq!(value["chains"][0]["steps"][1]["lesson"]["type"], "VIDEO");
        assert_eq!(value["chains"][0]["steps"][1]["prerequisite"]["id"], "101");
        assert_eq!(value["diagnostics"][0]["kind"], "empty_chain");
    }

    #[test]
    fn test_write_to_file() {
        let plan = sample_plan();
        let path = std::env::temp_dir().join(format!("drip-plan-{}.json", std::process::id()));

        JsonRenderer::new(&plan).write_to_file(&path, false).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let parsed: DripPlan = serde_json::from_str(&written).unwrap();
        assert!(matches!(parsed.diagnostics[0], Diagnostic::EmptyChain { .. }));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let plan = sample_plan();
        let path = Path::new("/nonexistent-drip-dir/plan.json");

        let err = JsonRenderer::new(&plan).write_to_file(path, true).unwrap_err();

        assert!(matches!(err, ReportError::Io(_)));
    }
}
