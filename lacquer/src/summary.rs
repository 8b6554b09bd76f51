//! `ExecutionSummary` — the one user-facing artifact of a run (§6):
//! `{run_id, status, start/end/duration, steps, inputs, state, outputs,
//! total_tokens, estimated_cost}`.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use lacquer_context::{ExecutionContext, OverallStatus, StepResolver};
use lacquer_core::{StepKind, StepResult, TokenUsage, Workflow};
use lacquer_template::{render, FunctionTable};

use crate::cost::CostModel;

/// The outbound shape of a completed, cancelled, or deadlocked run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// The run's id.
    pub run_id: String,
    /// Final run status.
    pub status: OverallStatus,
    /// Wall-clock start time.
    pub start_time: SystemTime,
    /// Wall-clock end time, set once the run reaches a terminal status.
    pub end_time: Option<SystemTime>,
    /// `end_time - start_time`, if both are known.
    pub duration: Option<Duration>,
    /// Every declared step's result, in workflow order.
    pub steps: Vec<StepResult>,
    /// The run's inputs, as supplied.
    pub inputs: serde_json::Value,
    /// Final state snapshot.
    pub state: HashMap<String, serde_json::Value>,
    /// `workflow.outputs` templates, rendered against the final context.
    pub outputs: HashMap<String, String>,
    /// Summed token usage across every step that called a model.
    pub total_tokens: TokenUsage,
    /// Estimated monetary cost, present only when every agent step's model
    /// was priced by the supplied [`CostModel`].
    pub estimated_cost: Option<f64>,
}

/// Assemble the summary for a run that has finished dispatching (terminal
/// `overall_status`, or `Running` if the caller is inspecting mid-flight).
pub fn build_summary(
    workflow: &Workflow,
    ctx: &ExecutionContext,
    functions: &FunctionTable,
    cost_model: &dyn CostModel,
) -> ExecutionSummary {
    let steps: Vec<StepResult> = workflow.workflow.steps.iter().filter_map(|s| ctx.step_result(&s.id)).collect();

    let mut total_tokens = TokenUsage::default();
    let mut estimated_cost: Option<f64> = None;
    for (step, result) in workflow.workflow.steps.iter().zip(&steps) {
        total_tokens = total_tokens + result.token_usage;
        if let StepKind::Agent { agent, .. } = &step.kind {
            if let Some(agent_cfg) = workflow.agents.get(agent) {
                if let Some(cost) = cost_model.estimate(&agent_cfg.model, &result.token_usage) {
                    *estimated_cost.get_or_insert(0.0) += cost;
                }
            }
        }
    }

    let resolver = StepResolver::new(ctx, "");
    let outputs = workflow
        .workflow
        .outputs
        .iter()
        .map(|(key, template)| {
            let rendered = render(template, &resolver, functions).unwrap_or_else(|err| err.to_string());
            (key.clone(), rendered)
        })
        .collect();

    let start_time = ctx.start_time();
    let end_time = ctx.completed_at();
    let duration = end_time.and_then(|end| end.duration_since(start_time).ok());

    ExecutionSummary {
        run_id: ctx.run_id().as_str().to_string(),
        status: ctx.overall_status(),
        start_time,
        end_time,
        duration,
        steps,
        inputs: ctx.inputs().clone(),
        state: ctx.all_state(),
        outputs,
        total_tokens,
        estimated_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{NullCostModel, PerTokenCostModel};
    use lacquer_core::{Agent, Step, WorkflowBody};
    use std::collections::HashMap as Map;

    fn workflow() -> Workflow {
        let mut agents = Map::new();
        agents.insert(
            "writer".to_string(),
            Agent { provider: "stub".into(), model: "stub-1".into(), system_prompt: None, temperature: None, max_tokens: None, top_p: None, tools: vec![] },
        );
        Workflow {
            version: "1".into(),
            name: None,
            metadata: Map::new(),
            agents,
            workflow: WorkflowBody {
                inputs: serde_json::json!({"name": "Alice"}),
                state: Map::new(),
                steps: vec![Step {
                    id: "greet".into(),
                    kind: StepKind::Agent { agent: "writer".into(), prompt: "hi".into() },
                    condition: None,
                    skip_if: None,
                    updates: Map::new(),
                    timeout_ms: None,
                }],
                outputs: Map::from([("greeting".to_string(), "{{ steps.greet.output }}".to_string())]),
            },
        }
    }

    #[test]
    fn summary_with_null_cost_model_has_no_estimate() {
        let workflow = workflow();
        let ctx = ExecutionContext::new(&workflow, workflow.workflow.inputs.clone());
        ctx.mark_step_running("greet");
        ctx.mark_step_completed("greet", Map::new(), Some("hello Alice".into()), TokenUsage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 });

        let summary = build_summary(&workflow, &ctx, &FunctionTable::with_builtins(), &NullCostModel);
        assert_eq!(summary.total_tokens.total_tokens, 15);
        assert_eq!(summary.estimated_cost, None);
        assert_eq!(summary.outputs.get("greeting").map(String::as_str), Some("hello Alice"));
    }

    #[test]
    fn summary_with_priced_model_sums_cost_across_steps() {
        let workflow = workflow();
        let ctx = ExecutionContext::new(&workflow, workflow.workflow.inputs.clone());
        ctx.mark_step_running("greet");
        ctx.mark_step_completed(
            "greet",
            Map::new(),
            Some("hello".into()),
            TokenUsage { prompt_tokens: 1_000_000, completion_tokens: 1_000_000, total_tokens: 2_000_000 },
        );

        let model = PerTokenCostModel::new().with_rate("stub-1", 1.0, 2.0);
        let summary = build_summary(&workflow, &ctx, &FunctionTable::with_builtins(), &model);
        assert_eq!(summary.estimated_cost, Some(3.0));
    }
}
