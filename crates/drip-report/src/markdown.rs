//! Markdown rendering of drip plans.
//!
//! The document has a summary table, one unlock table per chain, and a
//! diagnostics list, followed by a generation footer.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::{ChainPlan, DiagnosticLevel, DripPlan};

/// Renders a [`DripPlan`] as Markdown.
pub struct MarkdownRenderer<'a> {
    plan: &'a DripPlan,
}

impl<'a> MarkdownRenderer<'a> {
    /// Creates a renderer for the given plan.
    #[must_use]
    pub const fn new(plan: &'a DripPlan) -> Self {
        Self { plan }
    }

    /// Renders the complete document.
    #[must_use]
    pub fn render(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_summary(&mut output);
        self.write_chains(&mut output);
        self.write_diagnostics(&mut output);
        self.write_footer(&mut output);

        output
    }

    fn write_title(&self, output: &mut String) {
        let _ = writeln!(
            output,
            "# Drip Plan: Course {}\n",
            escape_markdown(&self.plan.course_id)
        );
    }

    fn write_summary(&self, output: &mut String) {
        let summary = &self.plan.summary;

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Chains | {} |", summary.chains);
        let _ = writeln!(output, "| Chained lessons | {} |", summary.chained_lessons);
        let _ = writeln!(output, "| Course lessons | {} |", summary.inventory_lessons);
        let _ = writeln!(output, "| Never gated | {} |", summary.ungated_lessons);
        let _ = writeln!(output);
    }

    fn write_chains(&self, output: &mut String) {
        let _ = writeln!(output, "## Chains\n");

        if self.plan.chains.is_empty() {
            let _ = writeln!(output, "*No drip chains defined.*\n");
            return;
        }

        for chain in &self.plan.chains {
            write_chain(output, chain);
        }
    }

    fn write_diagnostics(&self, output: &mut String) {
        let _ = writeln!(output, "## Diagnostics\n");

        if self.plan.diagnostics.is_empty() {
            let _ = writeln!(output, "*No issues found.*\n");
            return;
        }

        for diagnostic in &self.plan.diagnostics {
            let marker = match diagnostic.level() {
                DiagnosticLevel::Warning => "**Warning**",
                DiagnosticLevel::Info => "Info",
            };
            let _ = writeln!(
                output,
                "- {marker}: {}",
                escape_markdown(&diagnostic.description())
            );
        }
        let _ = writeln!(output);
    }

    fn write_footer(&self, output: &mut String) {
        let _ = writeln!(output, "---");
        let _ = writeln!(
            output,
            "*Generated at {}*",
            format_timestamp(&self.plan.generated_at)
        );
    }
}

fn write_chain(output: &mut String, chain: &ChainPlan) {
    let _ = writeln!(output, "### {}\n", escape_markdown(&chain.chain_id));

    if chain.steps.is_empty() {
        let _ = writeln!(output, "*Empty chain.*\n");
        return;
    }

    let _ = writeln!(output, "| Step | Lesson | Type | Unlocks after |");
    let _ = writeln!(output, "|------|--------|------|---------------|");
    for step in &chain.steps {
        let prerequisite = step
            .prerequisite
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| escape_markdown(&p.title));
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} |",
            step.step,
            escape_markdown(&step.lesson.title),
            step.lesson.kind,
            prerequisite
        );
    }
    let _ = writeln!(output);
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Formats a timestamp for display.
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Escapes characters with special meaning in Markdown tables.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}
