//! Drip Plan Reports
//!
//! Turns a course's drip chains into an unlock plan: for every chain, the
//! order in which lessons unlock and what each one waits on, plus
//! diagnostics about chains that will not save the way an author expects.
//!
//! # Renderers
//!
//! - [`MarkdownRenderer`] - human-readable plan
//! - [`json::JsonRenderer`] - compact or pretty JSON
//!
//! # Example
//!
//! ```rust
//! use drip_core::{DripChain, Inventory};
//! use drip_report::{DripPlan, MarkdownRenderer};
//!
//! let plan = DripPlan::build("42", &Inventory::default(), &[DripChain::new("drip-1")]);
//! let markdown = MarkdownRenderer::new(&plan).render();
//! assert!(markdown.contains("# Drip Plan: Course 42"));
//! ```

pub mod json;
mod markdown;

use std::collections::{BTreeMap, HashSet};

pub use markdown::MarkdownRenderer;

use chrono::{DateTime, Utc};
use drip_core::{DripChain, Inventory, LessonRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while rendering a plan.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the plan to JSON.
    #[error("failed to serialize plan: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write the plan file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Plan
// ============================================================================

/// One position in a chain's unlock order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockStep {
    /// 1-based position in the chain.
    pub step: usize,
    /// The lesson unlocked at this step.
    pub lesson: LessonRef,
    /// Lesson that must be completed first; `None` for the chain head.
    pub prerequisite: Option<LessonRef>,
}

/// Unlock order of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPlan {
    /// Chain id.
    pub chain_id: String,
    /// Steps in unlock order.
    pub steps: Vec<UnlockStep>,
}

/// How much attention a diagnostic deserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Expected but worth knowing.
    Info,
    /// Likely not what the author intended.
    Warning,
}

/// Something notable about the chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The chain has no lessons and is not saved.
    EmptyChain {
        /// Chain id.
        chain_id: String,
    },
    /// The chain has one lesson; it saves as an edge with no successors.
    SingleLessonChain {
        /// Chain id.
        chain_id: String,
        /// The only lesson.
        lesson_id: String,
    },
    /// The lesson sits in more than one chain.
    SharedLesson {
        /// Lesson id.
        lesson_id: String,
        /// Chains holding the lesson, in chain order.
        chain_ids: Vec<String>,
    },
    /// The chain references a lesson the inventory does not have.
    UnknownLesson {
        /// Chain id.
        chain_id: String,
        /// Lesson id.
        lesson_id: String,
    },
}

impl Diagnostic {
    /// Returns the diagnostic's level.
    #[must_use]
    pub const fn level(&self) -> DiagnosticLevel {
        match self {
            Self::SingleLessonChain { .. } => DiagnosticLevel::Info,
            Self::EmptyChain { .. } | Self::SharedLesson { .. } | Self::UnknownLesson { .. } => {
                DiagnosticLevel::Warning
            }
        }
    }

    /// Returns a one-line description.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::EmptyChain { chain_id } => {
                format!("Chain {chain_id} is empty and will not be saved")
            }
            Self::SingleLessonChain {
                chain_id,
                lesson_id,
            } => format!("Chain {chain_id} only holds lesson {lesson_id} and gates nothing"),
            Self::SharedLesson {
                lesson_id,
                chain_ids,
            } => format!(
                "Lesson {lesson_id} appears in several chains: {}",
                chain_ids.join(", ")
            ),
            Self::UnknownLesson {
                chain_id,
                lesson_id,
            } => format!("Chain {chain_id} references lesson {lesson_id}, which is not in the course"),
        }
    }
}

/// Headline counts of a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Number of chains, empty ones included.
    pub chains: usize,
    /// Distinct lessons placed in at least one chain.
    pub chained_lessons: usize,
    /// Lessons in the course inventory.
    pub inventory_lessons: usize,
    /// Inventory lessons that no chain locks behind a prerequisite.
    pub ungated_lessons: usize,
}

/// Unlock plan for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DripPlan {
    /// Course the plan describes.
    pub course_id: String,
    /// When the plan was built.
    pub generated_at: DateTime<Utc>,
    /// Headline counts.
    pub summary: PlanSummary,
    /// Per-chain unlock order, in chain order.
    pub chains: Vec<ChainPlan>,
    /// Findings, chain-level ones first.
    pub diagnostics: Vec<Diagnostic>,
}

impl DripPlan {
    /// Builds the plan for `chains` against the course inventory.
    #[must_use]
    pub fn build(course_id: impl Into<String>, inventory: &Inventory, chains: &[DripChain]) -> Self {
        let mut diagnostics = Vec::new();
        let mut placements: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut gated: HashSet<&str> = HashSet::new();

        let chain_plans = chains
            .iter()
            .map(|chain| {
                match chain.lessons.as_slice() {
                    [] => diagnostics.push(Diagnostic::EmptyChain {
                        chain_id: chain.id.clone(),
                    }),
                    [only] => diagnostics.push(Diagnostic::SingleLessonChain {
                        chain_id: chain.id.clone(),
                        lesson_id: only.id.clone(),
                    }),
                    _ => {}
                }

                let mut seen_here = HashSet::new();
                for lesson in &chain.lessons {
                    if !seen_here.insert(lesson.id.as_str()) {
                        continue;
                    }
                    if inventory.find_lesson(&lesson.id).is_none() {
                        diagnostics.push(Diagnostic::UnknownLesson {
                            chain_id: chain.id.clone(),
                            lesson_id: lesson.id.clone(),
                        });
                    }
                    placements
                        .entry(lesson.id.as_str())
                        .or_default()
                        .push(chain.id.as_str());
                }
                gated.extend(chain.lessons.iter().skip(1).map(|l| l.id.as_str()));

                ChainPlan {
                    chain_id: chain.id.clone(),
                    steps: unlock_steps(&chain.lessons),
                }
            })
            .collect();

        diagnostics.extend(
            placements
                .iter()
                .filter(|(_, chain_ids)| chain_ids.len() > 1)
                .map(|(lesson_id, chain_ids)| Diagnostic::SharedLesson {
                    lesson_id: (*lesson_id).to_string(),
                    chain_ids: chain_ids.iter().map(|id| (*id).to_string()).collect(),
                }),
        );

        let summary = PlanSummary {
            chains: chains.len(),
            chained_lessons: placements.len(),
            inventory_lessons: inventory.lesson_count(),
            ungated_lessons: inventory
                .lessons()
                .filter(|l| !gated.contains(l.id.as_str()))
                .count(),
        };

        Self {
            course_id: course_id.into(),
            generated_at: Utc::now(),
            summary,
            chains: chain_plans,
            diagnostics,
        }
    }

    /// Returns `true` if any diagnostic is a warning.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level() == DiagnosticLevel::Warning)
    }
}

fn unlock_steps(lessons: &[LessonRef]) -> Vec<UnlockStep> {
    lessons
        .iter()
        .enumerate()
        .map(|(i, lesson)| UnlockStep {
            step: i + 1,
            lesson: lesson.clone(),
            prerequisite: i.checked_sub(1).map(|prev| lessons[prev].clone()),
        })
        .collect()
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::{chain, inventory};
    use super::*;

    #[test]
    fn test_unlock_steps_follow_chain_order() {
        let plan = DripPlan::build("42", &inventory(), &[chain("drip-1", &["101", "103", "102"])]);

        let steps = &plan.chains[0].steps;
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].step, 1);
        assert!(steps[0].prerequisite.is_none());
        assert_eq!(steps[1].lesson.id, "103");
        assert_eq!(steps[1].prerequisite.as_ref().unwrap().id, "101");
        assert_eq!(steps[2].prerequisite.as_ref().unwrap().id, "103");
        assert!(plan.diagnostics.is_empty());
    }

    #[test]
    fn test_degenerate_chains_are_diagnosed() {
        let plan = DripPlan::build(
            "42",
            &inventory(),
            &[chain("drip-1", &[]), chain("drip-2", &["201"])],
        );

        assert_eq!(
            plan.diagnostics,
            vec![
                Diagnostic::EmptyChain {
                    chain_id: "drip-1".to_string()
                },
                Diagnostic::SingleLessonChain {
                    chain_id: "drip-2".to_string(),
                    lesson_id: "201".to_string()
                },
            ]
        );
        assert!(plan.has_warnings());
    }

    #[test]
    fn test_shared_and_unknown_lessons() {
        let plan = DripPlan::build(
            "42",
            &inventory(),
            &[
                chain("drip-1", &["101", "102"]),
                chain("drip-2", &["102", "999"]),
            ],
        );

        assert!(plan.diagnostics.contains(&Diagnostic::UnknownLesson {
            chain_id: "drip-2".to_string(),
            lesson_id: "999".to_string(),
        }));
        assert!(plan.diagnostics.contains(&Diagnostic::SharedLesson {
            lesson_id: "102".to_string(),
            chain_ids: vec!["drip-1".to_string(), "drip-2".to_string()],
        }));
    }

    #[test]
    fn test_repeated_lesson_in_one_chain_is_not_shared() {
        let plan = DripPlan::build(
            "42",
            &inventory(),
            &[
                chain("drip-1", &["101", "102", "101"]),
                chain("drip-2", &["102"]),
            ],
        );

        let shared: Vec<_> = plan
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::SharedLesson { .. }))
            .collect();
        assert_eq!(
            shared,
            vec![&Diagnostic::SharedLesson {
                lesson_id: "102".to_string(),
                chain_ids: vec!["drip-1".to_string(), "drip-2".to_string()],
            }]
        );
        assert_eq!(plan.summary.chained_lessons, 2);
    }

    #[test]
    fn test_summary_counts() {
        let plan = DripPlan::build(
            "42",
            &inventory(),
            &[
                chain("drip-1", &["101", "102"]),
                chain("drip-2", &["101", "103"]),
                chain("drip-3", &[]),
            ],
        );

        assert_eq!(
            plan.summary,
            PlanSummary {
                chains: 3,
                chained_lessons: 3,
                inventory_lessons: 4,
                ungated_lessons: 2,
            }
        );
    }

    #[test]
    fn test_single_lesson_chain_is_not_a_warning() {
        let plan = DripPlan::build("42", &inventory(), &[chain("drip-1", &["101"])]);

        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(plan.diagnostics[0].level(), DiagnosticLevel::Info);
        assert!(!plan.has_warnings());
    }

    #[test]
    fn test_diagnostic_serialization() {
        let diagnostic = Diagnostic::SharedLesson {
            lesson_id: "7".to_string(),
            chain_ids: vec!["drip-1".to_string(), "drip-4".to_string()],
        };

        let json = serde_json::to_value(&diagnostic).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"kind": "shared_lesson", "lesson_id": "7", "chain_ids": ["drip-1", "drip-4"]})
        );
    }
}
