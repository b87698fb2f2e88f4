//! Reference extraction for the example dataset generator.
//!
//! For an interactive declaration, collects the paths of every reference in
//! the interpreted `tactic` of each tactic step, in step order.

use crate::schema::{Declaration, DeclarationKind, Step, StepKind};

/// Reference paths used by one step (empty unless it is a tactic step).
#[must_use]
pub fn step_references(step: &Step) -> Vec<&str> {
    match &step.kind {
        StepKind::Tactic { tactic, .. } => tactic.references.iter().map(|r| r.path()).collect(),
        StepKind::StartSubproof | StepKind::EndSubproof | StepKind::Bullet { .. } => Vec::new(),
    }
}

/// Reference paths used by the tactic steps of `decl`, duplicates kept.
#[must_use]
pub fn tactic_references(decl: &Declaration) -> Vec<&str> {
    match &decl.kind {
        DeclarationKind::Interactive { steps, .. } => {
            steps.iter().flat_map(step_references).collect()
        }
        DeclarationKind::Inductive
        | DeclarationKind::Constructor { .. }
        | DeclarationKind::Assumption
        | DeclarationKind::Definition { .. } => Vec::new(),
    }
}

/// One dataset line: `path: ref1, ref2, ...`.
#[must_use]
pub fn dataset_line(decl: &Declaration) -> String {
    format!("{}: {}", decl.path, tactic_references(decl).join(", "))
}
