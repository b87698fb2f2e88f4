//! Strict decode from a generic value tree into the trace schema.
//!
//! Both encodings are first parsed into a [`serde_json::Value`] and then
//! walked here by recursive descent. For every node:
//!
//! - required fields must be present,
//! - tagged unions must carry a string `type` naming a known variant,
//! - undeclared fields are rejected (including on field-less variants),
//! - scalars are never coerced (`1` is not a string, `null` is not a list).
//!
//! The walker keeps the current [`NodePath`] so every [`ValidationError`]
//! points at the offending node. Recursion depth follows the event nesting of
//! the input; callers provision stack via [`crate::codec::CodecOptions`].

use serde_json::{Map, Value};

use crate::error::{NodePath, Segment, ValidationError, Violation};
use crate::schema::{
    Declaration, DeclarationKind, Event, Goal, Hyp, HypKind, Outcome, PrintingVariants,
    Reference, Step, StepKind, TacticKind,
};
use crate::stack;
use crate::trace::TraceFile;

type Obj = Map<String, Value>;
type R<T> = Result<T, ValidationError>;

/// Validate a whole trace document.
pub fn trace_file(v: &Value) -> R<TraceFile> {
    Walker::default().trace_file(v)
}

fn shape(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[derive(Default)]
struct Walker {
    path: Vec<Segment>,
}

impl Walker {
    /* ---------------- Primitives ---------------- */

    fn fail<T>(&self, violation: Violation) -> R<T> {
        Err(ValidationError {
            path: NodePath(self.path.clone()),
            violation,
        })
    }

    fn wrong_type<T>(&self, expected: &'static str, found: &Value) -> R<T> {
        self.fail(Violation::WrongType {
            expected,
            found: shape(found),
        })
    }

    fn at<T>(&mut self, seg: Segment, f: impl FnOnce(&mut Self) -> R<T>) -> R<T> {
        self.path.push(seg);
        let out = f(self);
        self.path.pop();
        out
    }

    /// Reject any key of `map` not listed in `fields`.
    fn only(&self, map: &Obj, fields: &[&'static str]) -> R<()> {
        match map.keys().find(|k| !fields.contains(&k.as_str())) {
            Some(extra) => self.fail(Violation::UnknownField(extra.clone())),
            None => Ok(()),
        }
    }

    fn object<'v>(&self, v: &'v Value, fields: &[&'static str]) -> R<&'v Obj> {
        let Value::Object(map) = v else {
            return self.wrong_type("object", v);
        };
        self.only(map, fields)?;
        Ok(map)
    }

    /// Split a tagged value into its map and discriminator.
    fn tagged<'v>(&mut self, v: &'v Value, union: &'static str) -> R<(&'v Obj, &'v str)> {
        let Value::Object(map) = v else {
            return self.wrong_type("object", v);
        };
        match map.get("type") {
            None => self.fail(Violation::MissingTag { union }),
            Some(Value::String(tag)) => Ok((map, tag.as_str())),
            Some(other) => self.at(Segment::Field("type"), |w| w.wrong_type("string", other)),
        }
    }

    fn unknown_tag<T>(&self, union: &'static str, found: &str) -> R<T> {
        self.fail(Violation::UnknownTag {
            union,
            found: found.to_owned(),
        })
    }

    fn field<'v, T>(
        &mut self,
        map: &'v Obj,
        name: &'static str,
        f: impl FnOnce(&mut Self, &'v Value) -> R<T>,
    ) -> R<T> {
        let Some(v) = map.get(name) else {
            return self.fail(Violation::MissingField(name));
        };
        self.at(Segment::Field(name), |w| f(w, v))
    }

    fn string(&mut self, v: &Value) -> R<String> {
        match v {
            Value::String(s) => Ok(s.clone()),
            other => self.wrong_type("string", other),
        }
    }

    fn str_field(&mut self, map: &Obj, name: &'static str) -> R<String> {
        self.field(map, name, Self::string)
    }

    fn list<T>(&mut self, v: &Value, mut item: impl FnMut(&mut Self, &Value) -> R<T>) -> R<Vec<T>> {
        let Value::Array(items) = v else {
            return self.wrong_type("list", v);
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, x) in items.iter().enumerate() {
            out.push(self.at(Segment::Index(i), |w| item(w, x))?);
        }
        Ok(out)
    }

    fn goals_field(&mut self, map: &Obj, name: &'static str) -> R<Vec<Goal>> {
        self.field(map, name, |w, v| w.list(v, Self::goal))
    }

    /* ---------------- Schema ---------------- */

    fn trace_file(&mut self, v: &Value) -> R<TraceFile> {
        let map = self.object(v, &["sub_filenames", "declarations"])?;
        let sub_filenames = self.field(map, "sub_filenames", |w, v| w.list(v, Self::string))?;
        let declarations = self.field(map, "declarations", |w, v| w.list(v, Self::declaration))?;
        Ok(TraceFile {
            sub_filenames,
            declarations,
        })
    }

    fn reference(&mut self, v: &Value) -> R<Reference> {
        let (map, tag) = self.tagged(v, "Reference")?;
        match tag {
            "Const" => {
                self.only(map, &["type", "path"])?;
                Ok(Reference::Const {
                    path: self.str_field(map, "path")?,
                })
            }
            "Ind" => {
                self.only(map, &["type", "path"])?;
                Ok(Reference::Ind {
                    path: self.str_field(map, "path")?,
                })
            }
            "Construct" => {
                self.only(map, &["type", "ind_path", "path"])?;
                Ok(Reference::Construct {
                    ind_path: self.str_field(map, "ind_path")?,
                    path: self.str_field(map, "path")?,
                })
            }
            other => self.unknown_tag("Reference", other),
        }
    }

    fn printing_variants(&mut self, v: &Value) -> R<PrintingVariants> {
        let map = self.object(
            v,
            &[
                "default",
                "full_path",
                "no_notations",
                "low_level",
                "default_pretty",
                "references",
            ],
        )?;
        Ok(PrintingVariants {
            default: self.str_field(map, "default")?,
            full_path: self.str_field(map, "full_path")?,
            no_notations: self.str_field(map, "no_notations")?,
            low_level: self.str_field(map, "low_level")?,
            default_pretty: self.str_field(map, "default_pretty")?,
            references: self.field(map, "references", |w, v| w.list(v, Self::reference))?,
        })
    }

    fn hyp(&mut self, v: &Value) -> R<Hyp> {
        let map = self.object(v, &["name", "type_", "kind"])?;
        Ok(Hyp {
            name: self.str_field(map, "name")?,
            ty: self.field(map, "type_", Self::printing_variants)?,
            kind: self.field(map, "kind", Self::hyp_kind)?,
        })
    }

    fn hyp_kind(&mut self, v: &Value) -> R<HypKind> {
        let (map, tag) = self.tagged(v, "HypKind")?;
        match tag {
            "Assumption" => {
                self.only(map, &["type"])?;
                Ok(HypKind::Assumption)
            }
            "Definition" => {
                self.only(map, &["type", "value"])?;
                Ok(HypKind::Definition {
                    value: self.field(map, "value", Self::printing_variants)?,
                })
            }
            other => self.unknown_tag("HypKind", other),
        }
    }

    fn goal(&mut self, v: &Value) -> R<Goal> {
        let map = self.object(v, &["hyps", "concl"])?;
        Ok(Goal {
            hyps: self.field(map, "hyps", |w, v| w.list(v, Self::hyp))?,
            concl: self.field(map, "concl", Self::printing_variants)?,
        })
    }

    fn tactic_kind(&mut self, v: &Value) -> R<TacticKind> {
        let (map, tag) = self.tagged(v, "TacticKind")?;
        let make: fn(String) -> TacticKind = match tag {
            "Primitive" => |s| TacticKind::Primitive { s },
            "Builtin" => |s| TacticKind::Builtin { s },
            "Alias" => |s| TacticKind::Alias { s },
            "ML" => |s| TacticKind::Ml { s },
            other => return self.unknown_tag("TacticKind", other),
        };
        self.only(map, &["type", "s"])?;
        Ok(make(self.str_field(map, "s")?))
    }

    fn event(&mut self, v: &Value) -> R<Event> {
        stack::guarded(|| self.event_node(v))
    }

    fn event_node(&mut self, v: &Value) -> R<Event> {
        let (map, tag) = self.tagged(v, "Event")?;
        match tag {
            "Sequence" => {
                self.only(map, &["type", "elements"])?;
                Ok(Event::Sequence {
                    elements: self.field(map, "elements", |w, v| w.list(v, Self::event))?,
                })
            }
            "Dispatch" => {
                self.only(map, &["type", "goals_before", "branches"])?;
                Ok(Event::Dispatch {
                    goals_before: self.goals_field(map, "goals_before")?,
                    branches: self.field(map, "branches", |w, v| w.list(v, Self::event))?,
                })
            }
            "Tactic" => {
                self.only(
                    map,
                    &["type", "goals_before", "goals_after", "kind", "tactic", "details"],
                )?;
                Ok(Event::Tactic {
                    goals_before: self.goals_field(map, "goals_before")?,
                    goals_after: self.goals_field(map, "goals_after")?,
                    kind: self.field(map, "kind", Self::tactic_kind)?,
                    tactic: self.field(map, "tactic", Self::printing_variants)?,
                    details: Box::new(self.field(map, "details", Self::event)?),
                })
            }
            "Message" => {
                self.only(map, &["type", "message"])?;
                Ok(Event::Message {
                    message: self.str_field(map, "message")?,
                })
            }
            other => self.unknown_tag("Event", other),
        }
    }

    fn step(&mut self, v: &Value) -> R<Step> {
        let map = self.object(v, &["goals_before", "goals_after", "kind"])?;
        Ok(Step {
            goals_before: self.goals_field(map, "goals_before")?,
            goals_after: self.goals_field(map, "goals_after")?,
            kind: self.field(map, "kind", Self::step_kind)?,
        })
    }

    fn step_kind(&mut self, v: &Value) -> R<StepKind> {
        let (map, tag) = self.tagged(v, "StepKind")?;
        match tag {
            "Tactic" => {
                self.only(map, &["type", "goal_selector", "tactic_raw", "tactic", "event"])?;
                Ok(StepKind::Tactic {
                    goal_selector: self.str_field(map, "goal_selector")?,
                    tactic_raw: self.str_field(map, "tactic_raw")?,
                    tactic: self.field(map, "tactic", Self::printing_variants)?,
                    event: self.field(map, "event", Self::event)?,
                })
            }
            "StartSubproof" => {
                self.only(map, &["type"])?;
                Ok(StepKind::StartSubproof)
            }
            "EndSubproof" => {
                self.only(map, &["type"])?;
                Ok(StepKind::EndSubproof)
            }
            "Bullet" => {
                self.only(map, &["type", "bullet"])?;
                Ok(StepKind::Bullet {
                    bullet: self.str_field(map, "bullet")?,
                })
            }
            other => self.unknown_tag("StepKind", other),
        }
    }

    fn outcome(&mut self, v: &Value) -> R<Outcome> {
        let (map, tag) = self.tagged(v, "Outcome")?;
        let outcome = match tag {
            "Admitted" => Outcome::Admitted,
            "Proved" => Outcome::Proved,
            "Exact" => Outcome::Exact,
            "Abort" => Outcome::Abort,
            "Fail" => Outcome::Fail,
            other => return self.unknown_tag("Outcome", other),
        };
        self.only(map, &["type"])?;
        Ok(outcome)
    }

    fn declaration_kind(&mut self, v: &Value) -> R<DeclarationKind> {
        let (map, tag) = self.tagged(v, "DeclarationKind")?;
        match tag {
            "Inductive" => {
                self.only(map, &["type"])?;
                Ok(DeclarationKind::Inductive)
            }
            "Constructor" => {
                self.only(map, &["type", "ind_path"])?;
                Ok(DeclarationKind::Constructor {
                    ind_path: self.str_field(map, "ind_path")?,
                })
            }
            "Assumption" => {
                self.only(map, &["type"])?;
                Ok(DeclarationKind::Assumption)
            }
            "Definition" => {
                self.only(map, &["type", "value", "equations"])?;
                Ok(DeclarationKind::Definition {
                    value: self.field(map, "value", Self::printing_variants)?,
                    equations: self
                        .field(map, "equations", |w, v| w.list(v, Self::printing_variants))?,
                })
            }
            "Interactive" => {
                self.only(map, &["type", "steps", "outcome"])?;
                Ok(DeclarationKind::Interactive {
                    steps: self.field(map, "steps", |w, v| w.list(v, Self::step))?,
                    outcome: self.field(map, "outcome", Self::outcome)?,
                })
            }
            other => self.unknown_tag("DeclarationKind", other),
        }
    }

    fn declaration(&mut self, v: &Value) -> R<Declaration> {
        let map = self.object(v, &["path", "type_", "kind"])?;
        Ok(Declaration {
            path: self.str_field(map, "path")?,
            ty: self.field(map, "type_", Self::printing_variants)?,
            kind: self.field(map, "kind", Self::declaration_kind)?,
        })
    }
}
