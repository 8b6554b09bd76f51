//! [`lacquer_template::Resolver`] over an [`ExecutionContext`] (C4).
//!
//! Every scope root but `workflow` is context-wide; `workflow.step_index`
//! is the one field that depends on *which* step is currently being
//! rendered, so the resolver is scoped to a single step rather than to the
//! whole context.

use crate::context::ExecutionContext;
use lacquer_core::StepStatus;
use lacquer_template::{ExpressionError, PathSegment, Resolver, Value};
use std::time::SystemTime;

/// A [`Resolver`] for templates rendered while executing one step.
///
/// Cheap to construct — borrows the context and holds only the id of the
/// step currently being evaluated.
pub struct StepResolver<'a> {
    ctx: &'a ExecutionContext,
    step_id: &'a str,
}

impl<'a> StepResolver<'a> {
    /// Build a resolver scoped to `step_id` within `ctx`.
    pub fn new(ctx: &'a ExecutionContext, step_id: &'a str) -> Self {
        Self { ctx, step_id }
    }
}

impl Resolver for StepResolver<'_> {
    fn resolve(&self, root: &str, path: &[PathSegment]) -> Result<Value, ExpressionError> {
        match root {
            "inputs" => resolve_from_value(Value::from_json(self.ctx.inputs()), path, "inputs"),
            "state" => {
                let whole = map_to_value(&self.ctx.all_state());
                resolve_from_value(whole, path, "state")
            }
            "metadata" => {
                let whole = map_to_value(self.ctx.metadata());
                resolve_from_value(whole, path, "metadata")
            }
            "env" => resolve_env(self.ctx, path),
            "workflow" => resolve_workflow(self.ctx, self.step_id, path),
            "steps" => resolve_steps(self.ctx, path),
            other => Err(ExpressionError::NotFound(other.to_string())),
        }
    }
}

fn map_to_value(map: &std::collections::HashMap<String, serde_json::Value>) -> Value {
    let object = serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    Value::from_json(&object)
}

/// Walk `path` off an already-lifted root `Value`. The first segment is
/// strict — a missing top-level field is `NotFound`, matching the
/// evaluator's treatment of an unresolvable scope-root identifier — while
/// deeper segments use [`Value::field`]/[`Value::index`]'s lenient,
/// `Nil`-on-missing behavior.
fn resolve_from_value(root_value: Value, path: &[PathSegment], root_name: &str) -> Result<Value, ExpressionError> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(root_value);
    };
    let first_value = match first {
        PathSegment::Field(name) => match &root_value {
            Value::Map(map) => map
                .get(name)
                .cloned()
                .ok_or_else(|| ExpressionError::NotFound(format!("{root_name}.{name}")))?,
            _ => {
                return Err(ExpressionError::TypeMismatch(format!(
                    "cannot access field `{name}` on {}",
                    root_value.type_name()
                )))
            }
        },
        PathSegment::Index(idx) => root_value.index(idx)?,
    };
    apply_trailing(first_value, rest)
}

fn apply_trailing(mut value: Value, trailing: &[PathSegment]) -> Result<Value, ExpressionError> {
    for seg in trailing {
        value = match seg {
            PathSegment::Field(name) => value.field(name)?,
            PathSegment::Index(idx) => value.index(idx)?,
        };
    }
    Ok(value)
}

fn resolve_env(ctx: &ExecutionContext, path: &[PathSegment]) -> Result<Value, ExpressionError> {
    match path {
        [PathSegment::Field(name)] => Ok(Value::String(ctx.env(name))),
        [] => Err(ExpressionError::NotFound("env".to_string())),
        _ => Err(ExpressionError::TypeMismatch(
            "env.<name> accepts exactly one field segment".to_string(),
        )),
    }
}

fn resolve_workflow(ctx: &ExecutionContext, step_id: &str, path: &[PathSegment]) -> Result<Value, ExpressionError> {
    let Some((first, rest)) = path.split_first() else {
        return Err(ExpressionError::NotFound("workflow".to_string()));
    };
    let PathSegment::Field(name) = first else {
        return Err(ExpressionError::TypeMismatch("workflow.<field> expects a named field".to_string()));
    };
    let value = match name.as_str() {
        "run_id" => Value::String(ctx.run_id().as_str().to_string()),
        "start_time" => Value::String(to_rfc3339(ctx.start_time())),
        "step_index" => match ctx.step_index(step_id) {
            Some(i) => Value::Number(i as f64),
            None => Value::Nil,
        },
        "total_steps" => Value::Number(ctx.total_steps() as f64),
        "completed_at" => ctx.completed_at().map(|t| Value::String(to_rfc3339(t))).unwrap_or(Value::Nil),
        other => return Err(ExpressionError::NotFound(format!("workflow.{other}"))),
    };
    apply_trailing(value, rest)
}

fn resolve_steps(ctx: &ExecutionContext, path: &[PathSegment]) -> Result<Value, ExpressionError> {
    let Some((id_seg, rest)) = path.split_first() else {
        return Err(ExpressionError::NotFound("steps".to_string()));
    };
    let PathSegment::Field(step_id) = id_seg else {
        return Err(ExpressionError::TypeMismatch("steps.<id> expects a named step id".to_string()));
    };
    let result = ctx
        .step_result(step_id)
        .ok_or_else(|| ExpressionError::NotFound(format!("steps.{step_id}")))?;

    let Some((field_seg, trailing)) = rest.split_first() else {
        return Ok(map_to_value(&result.output));
    };
    let PathSegment::Field(field) = field_seg else {
        return Err(ExpressionError::TypeMismatch(format!(
            "steps.{step_id}.<field> expects a named field"
        )));
    };

    let value = match field.as_str() {
        "status" => Value::String(status_str(result.status).to_string()),
        "duration" => result
            .duration()
            .map(|d| Value::Number(d.as_millis() as f64))
            .unwrap_or(Value::Nil),
        "output" | "response" => result.response.clone().map(Value::String).unwrap_or(Value::Nil),
        "error" => result.error.clone().map(Value::String).unwrap_or(Value::Nil),
        "success" => Value::Bool(result.status == StepStatus::Completed),
        "failed" => Value::Bool(result.status == StepStatus::Failed),
        "outputs" => map_to_value(&result.output),
        other => result
            .output
            .get(other)
            .map(Value::from_json)
            .ok_or_else(|| ExpressionError::NotFound(format!("steps.{step_id}.{other}")))?,
    };
    apply_trailing(value, trailing)
}

fn status_str(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "pending",
        StepStatus::Running => "running",
        StepStatus::Completed => "completed",
        StepStatus::Failed => "failed",
        StepStatus::Skipped => "skipped",
    }
}

fn to_rfc3339(time: SystemTime) -> String {
    chrono::DateTime::<chrono::Utc>::from(time).to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lacquer_core::{Step, StepKind, Workflow, WorkflowBody};
    use std::collections::HashMap;

    fn ctx_with_steps(step_ids: &[&str]) -> ExecutionContext {
        let wf = Workflow {
            version: "1".into(),
            name: None,
            metadata: HashMap::from([("owner".to_string(), serde_json::json!("alice"))]),
            agents: HashMap::new(),
            workflow: WorkflowBody {
                inputs: serde_json::json!({"name": "Alice", "topic": "ml"}),
                state: HashMap::from([("counter".to_string(), serde_json::json!(2))]),
                steps: step_ids
                    .iter()
                    .map(|id| Step {
                        id: id.to_string(),
                        kind: StepKind::Action {
                            action: "update_state".into(),
                            with: HashMap::new(),
                        },
                        condition: None,
                        skip_if: None,
                        updates: HashMap::new(),
                        timeout_ms: None,
                    })
                    .collect(),
                outputs: HashMap::new(),
            },
        };
        ExecutionContext::new(&wf, wf.workflow.inputs.clone())
    }

    #[test]
    fn resolves_inputs_and_state() {
        let ctx = ctx_with_steps(&["a"]);
        let resolver = StepResolver::new(&ctx, "a");
        assert_eq!(
            resolver.resolve("inputs", &[PathSegment::Field("name".into())]).unwrap(),
            Value::String("Alice".into())
        );
        assert_eq!(
            resolver.resolve("state", &[PathSegment::Field("counter".into())]).unwrap(),
            Value::Number(2.0)
        );
    }

    #[test]
    fn missing_top_level_input_is_not_found() {
        let ctx = ctx_with_steps(&["a"]);
        let resolver = StepResolver::new(&ctx, "a");
        assert!(resolver.resolve("inputs", &[PathSegment::Field("missing".into())]).is_err());
    }

    #[test]
    fn env_missing_key_is_empty_string() {
        let ctx = ctx_with_steps(&["a"]);
        let resolver = StepResolver::new(&ctx, "a");
        assert_eq!(
            resolver
                .resolve("env", &[PathSegment::Field("LACQUER_DEFINITELY_UNSET".into())])
                .unwrap(),
            Value::String(String::new())
        );
    }

    #[test]
    fn workflow_step_index_is_one_based() {
        let ctx = ctx_with_steps(&["a", "b", "c"]);
        let resolver = StepResolver::new(&ctx, "b");
        assert_eq!(
            resolver.resolve("workflow", &[PathSegment::Field("step_index".into())]).unwrap(),
            Value::Number(2.0)
        );
        assert_eq!(
            resolver.resolve("workflow", &[PathSegment::Field("total_steps".into())]).unwrap(),
            Value::Number(3.0)
        );
    }

    #[test]
    fn steps_field_resolves_contractual_status_and_custom_output_key() {
        let ctx = ctx_with_steps(&["a", "b"]);
        ctx.mark_step_completed(
            "a",
            HashMap::from([("summary".to_string(), serde_json::json!("done"))]),
            Some("ok".into()),
            Default::default(),
        );
        let resolver = StepResolver::new(&ctx, "b");
        assert_eq!(
            resolver.resolve("steps", &[PathSegment::Field("a".into()), PathSegment::Field("status".into())]).unwrap(),
            Value::String("completed".into())
        );
        assert_eq!(
            resolver
                .resolve("steps", &[PathSegment::Field("a".into()), PathSegment::Field("summary".into())])
                .unwrap(),
            Value::String("done".into())
        );
    }

    #[test]
    fn steps_unknown_step_id_is_not_found() {
        let ctx = ctx_with_steps(&["a"]);
        let resolver = StepResolver::new(&ctx, "a");
        assert!(resolver.resolve("steps", &[PathSegment::Field("ghost".into())]).is_err());
    }

    #[test]
    fn metadata_resolves_like_state() {
        let ctx = ctx_with_steps(&["a"]);
        let resolver = StepResolver::new(&ctx, "a");
        assert_eq!(
            resolver.resolve("metadata", &[PathSegment::Field("owner".into())]).unwrap(),
            Value::String("alice".into())
        );
    }
}
