//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tactrace_core::io::write_trace_auto;
use tactrace_core::{
    Declaration, DeclarationKind, Event, Goal, Hyp, HypKind, Outcome, PrintingVariants,
    Reference, Step, StepKind, TacticKind, TraceFile,
};

/// Printing variants whose renderings are all derived from `s`.
pub fn pv(s: &str) -> PrintingVariants {
    pv_refs(s, vec![])
}

pub fn pv_refs(s: &str, references: Vec<Reference>) -> PrintingVariants {
    PrintingVariants {
        default: s.to_owned(),
        full_path: format!("Top.{s}"),
        no_notations: format!("({s})"),
        low_level: format!("@{s}"),
        default_pretty: format!("{s}\n"),
        references,
    }
}

pub fn constant(path: &str) -> Reference {
    Reference::Const { path: path.into() }
}

pub fn goal() -> Goal {
    Goal {
        hyps: vec![
            Hyp {
                name: "n".into(),
                ty: pv("nat"),
                kind: HypKind::Assumption,
            },
            Hyp {
                name: "m".into(),
                ty: pv("nat"),
                kind: HypKind::Definition {
                    value: pv_refs("S n", vec![constant("nat.S"), constant("nat.S")]),
                },
            },
        ],
        concl: pv_refs(
            "n + 0 = n",
            vec![
                Reference::Ind { path: "eq".into() },
                Reference::Construct {
                    ind_path: "nat".into(),
                    path: "nat.O".into(),
                },
            ],
        ),
    }
}

/// An event touching every variant.
pub fn event() -> Event {
    Event::Sequence {
        elements: vec![
            Event::Message {
                message: "Ltac call".into(),
            },
            Event::Dispatch {
                goals_before: vec![goal()],
                branches: vec![
                    Event::Tactic {
                        goals_before: vec![goal()],
                        goals_after: vec![],
                        kind: TacticKind::Primitive { s: "exact".into() },
                        tactic: pv("exact eq_refl"),
                        details: Box::new(Event::Sequence { elements: vec![] }),
                    },
                    Event::Tactic {
                        goals_before: vec![],
                        goals_after: vec![],
                        kind: TacticKind::Ml { s: "auto".into() },
                        tactic: pv("auto"),
                        details: Box::new(Event::Message {
                            message: "ünïcödé ✓".into(),
                        }),
                    },
                ],
            },
            Event::Tactic {
                goals_before: vec![],
                goals_after: vec![goal()],
                kind: TacticKind::Alias { s: "now".into() },
                tactic: pv("now"),
                details: Box::new(Event::Message {
                    message: String::new(),
                }),
            },
            Event::Tactic {
                goals_before: vec![],
                goals_after: vec![],
                kind: TacticKind::Builtin { s: "intro".into() },
                tactic: pv("intro"),
                details: Box::new(Event::Sequence { elements: vec![] }),
            },
        ],
    }
}

pub fn tactic_step(raw: &str, refs: &[&str]) -> Step {
    Step {
        goals_before: vec![goal()],
        goals_after: vec![],
        kind: StepKind::Tactic {
            goal_selector: "1".into(),
            tactic_raw: raw.into(),
            tactic: pv_refs(raw, refs.iter().map(|p| constant(p)).collect()),
            event: event(),
        },
    }
}

pub fn simple(path: &str) -> Declaration {
    Declaration {
        path: path.into(),
        ty: pv("Set"),
        kind: DeclarationKind::Inductive,
    }
}

/// Declarations covering every kind, step kind and outcome.
pub fn all_kinds() -> Vec<Declaration> {
    let outcomes = [
        Outcome::Admitted,
        Outcome::Proved,
        Outcome::Exact,
        Outcome::Abort,
        Outcome::Fail,
    ];
    let mut out = vec![
        simple("Top.nat"),
        Declaration {
            path: "Top.nat.O".into(),
            ty: pv("nat"),
            kind: DeclarationKind::Constructor {
                ind_path: "Top.nat".into(),
            },
        },
        Declaration {
            path: "Top.ax".into(),
            ty: pv("False"),
            kind: DeclarationKind::Assumption,
        },
        Declaration {
            path: "Top.two".into(),
            ty: pv("nat"),
            kind: DeclarationKind::Definition {
                value: pv("S (S O)"),
                equations: vec![pv("two = S (S O)"), pv("two = 2")],
            },
        },
    ];
    for (i, outcome) in outcomes.into_iter().enumerate() {
        out.push(Declaration {
            path: format!("Top.lemma{i}"),
            ty: pv("forall n, n + 0 = n"),
            kind: DeclarationKind::Interactive {
                steps: vec![
                    tactic_step("intros n.", &["nat"]),
                    Step {
                        goals_before: vec![goal()],
                        goals_after: vec![goal()],
                        kind: StepKind::StartSubproof,
                    },
                    Step {
                        goals_before: vec![],
                        goals_after: vec![],
                        kind: StepKind::Bullet { bullet: "-".into() },
                    },
                    tactic_step("apply plus_n_O.", &["plus_n_O", "eq"]),
                    Step {
                        goals_before: vec![],
                        goals_after: vec![],
                        kind: StepKind::EndSubproof,
                    },
                ],
                outcome,
            },
        });
    }
    out
}

pub fn rich_trace() -> TraceFile {
    TraceFile {
        sub_filenames: vec!["a.json".into(), "dir/b.pickle.zst".into()],
        declarations: all_kinds(),
    }
}

/// `depth` nested events, alternating `Tactic` and `Sequence` wrappers.
pub fn nested_event(depth: usize) -> Event {
    let mut ev = Event::Message {
        message: "leaf".into(),
    };
    for i in 0..depth {
        ev = if i % 2 == 0 {
            Event::Tactic {
                goals_before: vec![],
                goals_after: vec![],
                kind: TacticKind::Builtin { s: "idtac".into() },
                tactic: pv("idtac"),
                details: Box::new(ev),
            }
        } else {
            Event::Sequence { elements: vec![ev] }
        };
    }
    ev
}

/// Trace with `n` simple declarations named `{prefix}{i}` and the given refs.
pub fn file_with(prefix: &str, n: usize, subs: &[&str]) -> TraceFile {
    TraceFile {
        sub_filenames: subs.iter().map(|s| (*s).to_owned()).collect(),
        declarations: (0..n).map(|i| simple(&format!("{prefix}{i}"))).collect(),
    }
}

pub fn write(dir: &Path, name: &str, t: &TraceFile) -> PathBuf {
    let p = dir.join(name);
    write_trace_auto(&p, t).unwrap();
    p
}

pub fn paths(decls: &[Declaration]) -> Vec<&str> {
    decls.iter().map(|d| d.path.as_str()).collect()
}

/// Run `f` on a thread with a large stack (deep trees recurse on drop and `==`).
pub fn on_big_stack<F: FnOnce() + Send + 'static>(f: F) {
    std::thread::Builder::new()
        .stack_size(512 << 20)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap();
}
