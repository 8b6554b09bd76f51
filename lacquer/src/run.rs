//! The facade's single entrypoint: run a validated workflow to completion
//! and hand back its [`ExecutionSummary`].

use std::sync::Arc;

use lacquer_context::ExecutionContext;
use lacquer_core::{NullSink, ProgressSink, Workflow};
use lacquer_exec::{ExecError, ExecutorConfig};
use lacquer_provider::ProviderRegistry;
use lacquer_template::FunctionTable;
use lacquer_tool::{BlockExecutor, ToolRegistry};

use crate::cost::{CostModel, NullCostModel};
use crate::summary::{build_summary, ExecutionSummary};

/// Run `workflow` with `inputs` against the given providers/tools/block
/// executor, returning its [`ExecutionSummary`] once the dispatch loop
/// reaches a terminal status.
///
/// A [`ExecError::WorkflowDeadlock`] or [`ExecError::WorkflowCancelled`] is
/// still returned as an error — those are conditions the scheduler detects
/// before any summary can be meaningfully built. Every other step-level
/// failure is folded into a `Failed` summary instead of an `Err` here.
#[allow(clippy::too_many_arguments)]
pub async fn run_workflow(
    workflow: &Workflow,
    inputs: serde_json::Value,
    providers: &ProviderRegistry,
    tools: &ToolRegistry,
    block_executor: Arc<dyn BlockExecutor>,
    config: &ExecutorConfig,
) -> Result<ExecutionSummary, ExecError> {
    run_workflow_with(workflow, inputs, providers, tools, block_executor, config, &NullSink, &NullCostModel).await
}

/// As [`run_workflow`], but with an explicit [`ProgressSink`] for the event
/// stream and a [`CostModel`] for `estimated_cost`.
#[allow(clippy::too_many_arguments)]
pub async fn run_workflow_with(
    workflow: &Workflow,
    inputs: serde_json::Value,
    providers: &ProviderRegistry,
    tools: &ToolRegistry,
    block_executor: Arc<dyn BlockExecutor>,
    config: &ExecutorConfig,
    sink: &dyn ProgressSink,
    cost_model: &dyn CostModel,
) -> Result<ExecutionSummary, ExecError> {
    let ctx = ExecutionContext::new(workflow, inputs);
    let functions = FunctionTable::with_builtins();

    lacquer_exec::run_workflow(workflow, &ctx, providers, tools, block_executor, &functions, config, sink).await?;

    Ok(build_summary(workflow, &ctx, &functions, cost_model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lacquer_core::{Agent, ContentBlock, ModelRequest, Step, StepKind, TokenUsage, WorkflowBody};
    use lacquer_provider::{ModelInfo, ModelProvider, ModelResponse, ProviderError, StopReason};
    use lacquer_tool::UnconfiguredBlockExecutor;
    use std::collections::HashMap;

    struct EchoProvider;

    #[async_trait]
    impl ModelProvider for EchoProvider {
        async fn generate(
            &self,
            request: &ModelRequest,
            _ctx: &ExecutionContext,
            _step_id: &str,
            _sink: &dyn ProgressSink,
        ) -> Result<ModelResponse, ProviderError> {
            let text = request.messages.last().and_then(|m| m.content.first()).and_then(ContentBlock::as_text).unwrap_or_default().to_string();
            Ok(ModelResponse {
                content: vec![ContentBlock::text(text)],
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage { prompt_tokens: 5, completion_tokens: 5, total_tokens: 10 },
                model: "echo-1".into(),
            })
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
            Ok(vec![ModelInfo { id: "echo-1".into(), display_name: "Echo".into(), context_window: None }])
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn workflow() -> Workflow {
        let mut agents = HashMap::new();
        agents.insert(
            "writer".to_string(),
            Agent { provider: "echo".into(), model: "echo-1".into(), system_prompt: None, temperature: None, max_tokens: None, top_p: None, tools: vec![] },
        );
        Workflow {
            version: "1".into(),
            name: None,
            metadata: HashMap::new(),
            agents,
            workflow: WorkflowBody {
                inputs: serde_json::json!({}),
                state: HashMap::new(),
                steps: vec![Step {
                    id: "greet".into(),
                    kind: StepKind::Agent { agent: "writer".into(), prompt: "{{ inputs.name }}".into() },
                    condition: None,
                    skip_if: None,
                    updates: HashMap::new(),
                    timeout_ms: None,
                }],
                outputs: HashMap::new(),
            },
        }
    }

    #[tokio::test]
    async fn run_workflow_returns_a_completed_summary() {
        let workflow = workflow();
        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(EchoProvider)).await.unwrap();
        let tools = ToolRegistry::new();
        let block_executor: Arc<dyn BlockExecutor> = Arc::new(UnconfiguredBlockExecutor);
        let config = ExecutorConfig::default();

        let summary = run_workflow(&workflow, serde_json::json!({"name": "Alice"}), &providers, &tools, block_executor, &config)
            .await
            .unwrap();

        assert_eq!(summary.status, lacquer_context::OverallStatus::Completed);
        assert_eq!(summary.steps.len(), 1);
        assert_eq!(summary.total_tokens.total_tokens, 10);
    }
}
