//! Trace schema: declarations, proof steps, tactic event trees and goals.
//!
//! Every tagged union serializes with an internal `type` discriminator
//! emitted before the variant's fields, and every struct serializes its fields
//! in declaration order. Together these fix the canonical key order of the
//! text encoding.
//!
//! There is no `Deserialize` impl: decoded values come from
//! [`crate::validate`] only.

use serde::{Serialize, Serializer};

use crate::stack;

/// Fully-qualified name of a constant, inductive or constructor.
pub type FullPath = String;

/// Pointer to another declaration by fully-qualified name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum Reference {
    /// A constant.
    Const {
        /// Constant name.
        path: FullPath,
    },
    /// An inductive type.
    Ind {
        /// Inductive name.
        path: FullPath,
    },
    /// A constructor of `ind_path`.
    Construct {
        /// Inductive the constructor belongs to.
        ind_path: FullPath,
        /// Constructor name.
        path: FullPath,
    },
}

impl Reference {
    /// The referenced name (the constructor's own path for `Construct`).
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Const { path } | Self::Ind { path } | Self::Construct { path, .. } => path,
        }
    }
}

/// Several renderings of one term plus the references occurring in it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PrintingVariants {
    /// Default printing.
    pub default: String,
    /// All names fully qualified.
    pub full_path: String,
    /// Notations disabled.
    pub no_notations: String,
    /// Low-level printing (no coercions, implicit arguments shown).
    pub low_level: String,
    /// Default printing with line breaks.
    pub default_pretty: String,
    /// References in occurrence order; duplicates are kept.
    pub references: Vec<Reference>,
}

/// A hypothesis in a goal context.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Hyp {
    /// Hypothesis name.
    pub name: String,
    /// Its type.
    #[serde(rename = "type_")]
    pub ty: PrintingVariants,
    /// Plain assumption or local definition.
    pub kind: HypKind,
}

/// Kind of hypothesis.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum HypKind {
    /// `x : T`.
    Assumption,
    /// `x := v : T`.
    Definition {
        /// Body of the local definition.
        value: PrintingVariants,
    },
}

/// A proof obligation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Goal {
    /// Local context.
    pub hyps: Vec<Hyp>,
    /// Conclusion.
    pub concl: PrintingVariants,
}

/// How a tactic was defined; each carries the raw invocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum TacticKind {
    /// Kernel-level primitive.
    Primitive {
        /// Raw invocation.
        s: String,
    },
    /// Builtin tactic.
    Builtin {
        /// Raw invocation.
        s: String,
    },
    /// User-level alias (notation).
    Alias {
        /// Raw invocation.
        s: String,
    },
    /// Tactic implemented in the prover's host language.
    #[serde(rename = "ML")]
    Ml {
        /// Raw invocation.
        s: String,
    },
}

impl TacticKind {
    /// The raw invocation string, whatever the kind.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Primitive { s } | Self::Builtin { s } | Self::Alias { s } | Self::Ml { s } => s,
        }
    }
}

/// Execution tree of a single tactic invocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Events run one after another.
    Sequence {
        /// Children in execution order.
        #[serde(serialize_with = "serialize_events")]
        elements: Vec<Event>,
    },
    /// One branch per focused goal.
    Dispatch {
        /// Goals the dispatch was applied to.
        goals_before: Vec<Goal>,
        /// Per-goal branches, in goal order.
        #[serde(serialize_with = "serialize_events")]
        branches: Vec<Event>,
    },
    /// A (sub)tactic call with its own nested execution.
    Tactic {
        /// Goals before the call.
        goals_before: Vec<Goal>,
        /// Goals after the call.
        goals_after: Vec<Goal>,
        /// How the tactic is defined.
        kind: TacticKind,
        /// The tactic expression.
        tactic: PrintingVariants,
        /// Nested execution.
        #[serde(serialize_with = "serialize_event")]
        details: Box<Event>,
    },
    /// Informational message emitted during execution.
    Message {
        /// Message text.
        message: String,
    },
}

/* ---------------- Deep event trees ---------------- */

fn serialize_event<S: Serializer>(ev: &Event, s: S) -> Result<S::Ok, S::Error> {
    stack::guarded(|| ev.serialize(s))
}

fn serialize_events<S: Serializer>(evs: &[Event], s: S) -> Result<S::Ok, S::Error> {
    struct Guarded<'a>(&'a Event);

    impl Serialize for Guarded<'_> {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            serialize_event(self.0, s)
        }
    }

    s.collect_seq(evs.iter().map(Guarded))
}

impl Event {
    /// Move direct child events into `out`, leaving `self` shallow.
    fn detach_children(&mut self, out: &mut Vec<Self>) {
        match self {
            Self::Sequence { elements } => out.append(elements),
            Self::Dispatch { branches, .. } => out.append(branches),
            Self::Tactic { details, .. } => {
                if !matches!(**details, Self::Message { .. }) {
                    let leaf = Self::Message {
                        message: String::new(),
                    };
                    out.push(std::mem::replace(&mut **details, leaf));
                }
            }
            Self::Message { .. } => {}
        }
    }
}

/// Dropping walks the tree with an explicit worklist, so arbitrarily deep
/// events are released on any stack.
impl Drop for Event {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut ev) = pending.pop() {
            ev.detach_children(&mut pending);
        }
    }
}

/// One user-issued proof instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Step {
    /// Goals before the step.
    pub goals_before: Vec<Goal>,
    /// Goals after the step.
    pub goals_after: Vec<Goal>,
    /// What the step was.
    pub kind: StepKind,
}

/// Kind of proof step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum StepKind {
    /// A tactic sentence.
    Tactic {
        /// Goal selector prefix (may be empty).
        goal_selector: String,
        /// Tactic as typed by the user.
        tactic_raw: String,
        /// Tactic as interpreted.
        tactic: PrintingVariants,
        /// Execution tree.
        event: Event,
    },
    /// `{`.
    StartSubproof,
    /// `}`.
    EndSubproof,
    /// A focusing bullet.
    Bullet {
        /// Bullet symbol (`-`, `+`, `*`, ...).
        bullet: String,
    },
}

/// How an interactive proof ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum Outcome {
    /// Closed with `Admitted`.
    Admitted,
    /// Closed with `Qed`/`Defined`.
    Proved,
    /// Given directly as a term.
    Exact,
    /// Abandoned.
    Abort,
    /// Failed.
    Fail,
}

/// Kind-specific payload of a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum DeclarationKind {
    /// An inductive type.
    Inductive,
    /// A constructor of `ind_path`.
    Constructor {
        /// Parent inductive.
        ind_path: FullPath,
    },
    /// An axiom or parameter.
    Assumption,
    /// A non-interactive definition.
    Definition {
        /// Body.
        value: PrintingVariants,
        /// Equation lemmas.
        equations: Vec<PrintingVariants>,
    },
    /// A definition or theorem proved step by step.
    Interactive {
        /// Steps in order.
        steps: Vec<Step>,
        /// Terminal outcome.
        outcome: Outcome,
    },
}

/// One named declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Declaration {
    /// Fully-qualified name.
    pub path: FullPath,
    /// Its type.
    #[serde(rename = "type_")]
    pub ty: PrintingVariants,
    /// Kind-specific payload.
    pub kind: DeclarationKind,
}
