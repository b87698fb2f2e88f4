//! Randomized traces survive every format, and flattening preserves order.

use proptest::prelude::*;
use tactrace_core::codec::{decode, encode, CodecOptions};
use tactrace_core::{
    Declaration, DeclarationKind, Event, Format, Goal, Hyp, HypKind, Outcome, PrintingVariants,
    Reference, Step, StepKind, TacticKind, TraceFile,
};

fn text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Z0-9_.]{0,12}",
        1 => any::<String>().prop_map(|s| s.chars().take(8).collect::<String>()),
    ]
}

fn reference() -> impl Strategy<Value = Reference> {
    prop_oneof![
        text().prop_map(|path| Reference::Const { path }),
        text().prop_map(|path| Reference::Ind { path }),
        (text(), text()).prop_map(|(ind_path, path)| Reference::Construct { ind_path, path }),
    ]
}

prop_compose! {
    fn printing()(
        s in text(),
        references in prop::collection::vec(reference(), 0..3),
    ) -> PrintingVariants {
        PrintingVariants {
            default: s.clone(),
            full_path: format!("M.{s}"),
            no_notations: s.clone(),
            low_level: format!("@{s}"),
            default_pretty: s,
            references,
        }
    }
}

fn hyp() -> impl Strategy<Value = Hyp> {
    let kind = prop_oneof![
        Just(HypKind::Assumption),
        printing().prop_map(|value| HypKind::Definition { value }),
    ];
    (text(), printing(), kind).prop_map(|(name, ty, kind)| Hyp { name, ty, kind })
}

fn goal() -> impl Strategy<Value = Goal> {
    (prop::collection::vec(hyp(), 0..3), printing()).prop_map(|(hyps, concl)| Goal { hyps, concl })
}

fn goals() -> impl Strategy<Value = Vec<Goal>> {
    prop::collection::vec(goal(), 0..2)
}

fn tactic_kind() -> impl Strategy<Value = TacticKind> {
    prop_oneof![
        text().prop_map(|s| TacticKind::Primitive { s }),
        text().prop_map(|s| TacticKind::Builtin { s }),
        text().prop_map(|s| TacticKind::Alias { s }),
        text().prop_map(|s| TacticKind::Ml { s }),
    ]
}

fn event() -> impl Strategy<Value = Event> {
    let leaf = text().prop_map(|message| Event::Message { message });
    leaf.prop_recursive(6, 32, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3)
                .prop_map(|elements| Event::Sequence { elements }),
            (goals(), prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(goals_before, branches)| Event::Dispatch {
                    goals_before,
                    branches
                }),
            (goals(), goals(), tactic_kind(), printing(), inner).prop_map(
                |(goals_before, goals_after, kind, tactic, details)| Event::Tactic {
                    goals_before,
                    goals_after,
                    kind,
                    tactic,
                    details: Box::new(details),
                }
            ),
        ]
    })
}

fn step() -> impl Strategy<Value = Step> {
    let kind = prop_oneof![
        (text(), text(), printing(), event()).prop_map(
            |(goal_selector, tactic_raw, tactic, event)| StepKind::Tactic {
                goal_selector,
                tactic_raw,
                tactic,
                event,
            }
        ),
        Just(StepKind::StartSubproof),
        Just(StepKind::EndSubproof),
        "[-+*]{1,3}".prop_map(|bullet| StepKind::Bullet { bullet }),
    ];
    (goals(), goals(), kind).prop_map(|(goals_before, goals_after, kind)| Step {
        goals_before,
        goals_after,
        kind,
    })
}

fn outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Admitted),
        Just(Outcome::Proved),
        Just(Outcome::Exact),
        Just(Outcome::Abort),
        Just(Outcome::Fail),
    ]
}

fn declaration() -> impl Strategy<Value = Declaration> {
    let kind = prop_oneof![
        Just(DeclarationKind::Inductive),
        text().prop_map(|ind_path| DeclarationKind::Constructor { ind_path }),
        Just(DeclarationKind::Assumption),
        (printing(), prop::collection::vec(printing(), 0..3))
            .prop_map(|(value, equations)| DeclarationKind::Definition { value, equations }),
        (prop::collection::vec(step(), 0..3), outcome())
            .prop_map(|(steps, outcome)| DeclarationKind::Interactive { steps, outcome }),
    ];
    (text(), printing(), kind).prop_map(|(path, ty, kind)| Declaration { path, ty, kind })
}

prop_compose! {
    fn trace_file()(
        sub_filenames in prop::collection::vec(text(), 0..3),
        declarations in prop::collection::vec(declaration(), 0..4),
    ) -> TraceFile {
        TraceFile { sub_filenames, declarations }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn encode_then_decode_is_identity(t in trace_file()) {
        let opts = CodecOptions::default();
        for f in [Format::TEXT, Format::TEXT_ZST, Format::BINARY, Format::BINARY_ZST] {
            let bytes = encode(&t, f, &opts).unwrap();
            prop_assert_eq!(&decode(&bytes, f, &opts).unwrap(), &t, "format {}", f);
        }
    }

    #[test]
    fn streamed_text_equals_eager_text(t in trace_file()) {
        let opts = CodecOptions::default();
        let eager = encode(&t, Format::TEXT, &opts).unwrap();
        let mut streamed = Vec::new();
        tactrace_core::codec::write_trace(&mut streamed, t.into_lazy(), Format::TEXT, &opts)
            .unwrap();
        prop_assert_eq!(eager, streamed);
    }

    #[test]
    fn join_preserves_order(parts in prop::collection::vec(trace_file(), 0..4)) {
        let expected: Vec<_> = parts.iter().flat_map(|t| t.declarations.clone()).collect();
        let joined = tactrace_core::join_traces(parts.into_iter().map(TraceFile::into_lazy))
            .force()
            .unwrap();
        prop_assert_eq!(joined.declarations, expected);
    }
}
