//! End-to-end scenarios against the public `lacquer` facade.
//!
//! The literal cases from `spec.md §8` are otherwise exercised close to
//! where they're implemented (`lacquer-exec::scheduler` for concurrency/
//! skip/deadlock, `lacquer-provider::retry` for the 503 case); this file
//! covers scenario 6 (sequential state mutation via an expression) and a
//! cancellation-promptness check through the one public entrypoint a
//! caller would actually use.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lacquer::prelude::*;
use lacquer_core::{Agent, ContentBlock, ModelRequest, StepKind, TokenUsage, WorkflowBody};
use lacquer_provider::{ModelInfo, ModelResponse, ProviderError, StopReason};
use lacquer_tool::UnconfiguredBlockExecutor;

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
        let text = request
            .messages
            .last()
            .and_then(|m| m.content.first())
            .and_then(ContentBlock::as_text)
            .unwrap_or_default()
            .to_string();
        Ok(ModelResponse {
            content: vec![ContentBlock::text(text)],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage { prompt_tokens: 1, completion_tokens: 1, total_tokens: 2 },
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

async fn harness() -> (ProviderRegistry, ToolRegistry, Arc<dyn BlockExecutor>) {
    let mut providers = ProviderRegistry::new();
    providers.register(Arc::new(EchoProvider)).await.unwrap();
    (providers, ToolRegistry::new(), Arc::new(UnconfiguredBlockExecutor))
}

fn bump_step(id: &str) -> Step {
    let mut with = HashMap::new();
    with.insert("counter".to_string(), serde_json::json!("{{ state.counter + 1 }}"));
    let mut updates = HashMap::new();
    updates.insert("counter".to_string(), "{{ state.counter + 1 }}".to_string());
    Step {
        id: id.to_string(),
        kind: StepKind::Action { action: "update_state".into(), with },
        condition: None,
        skip_if: None,
        updates,
        timeout_ms: None,
    }
}

fn counter_workflow(steps: Vec<Step>) -> Workflow {
    let mut state = HashMap::new();
    state.insert("counter".to_string(), serde_json::json!(0));
    Workflow {
        version: "1".into(),
        name: None,
        metadata: HashMap::new(),
        agents: HashMap::new(),
        workflow: WorkflowBody { inputs: serde_json::json!({}), state, steps, outputs: HashMap::new() },
    }
}

#[tokio::test]
async fn sequential_state_updates_accumulate_as_strings() {
    // spec.md §8 scenario 6: three sequential `update_state` steps each
    // rendering `{{ state.counter + 1 }}` leave `state.counter == "3"` —
    // the template engine's number-to-string coercion is part of the
    // contract, not a bug to paper over.
    let workflow = counter_workflow(vec![bump_step("bump1"), bump_step("bump2"), bump_step("bump3")]);
    let (providers, tools, block_executor) = harness().await;
    let config = ExecutorConfig { max_concurrent_steps: 1, ..ExecutorConfig::default() };

    let summary = run_workflow(&workflow, serde_json::json!({}), &providers, &tools, block_executor, &config)
        .await
        .unwrap();

    assert_eq!(summary.status, OverallStatus::Completed);
    assert_eq!(summary.state.get("counter").unwrap(), &serde_json::json!("3"));
    for id in ["bump1", "bump2", "bump3"] {
        let result = summary.steps.iter().find(|s| s.step_id == id).unwrap();
        assert_eq!(result.status, StepStatus::Completed);
    }
}

#[tokio::test]
async fn interpolated_prompts_reference_prior_step_responses() {
    let mut agents = HashMap::new();
    agents.insert(
        "writer".to_string(),
        Agent { provider: "echo".into(), model: "echo-1".into(), system_prompt: None, temperature: None, max_tokens: None, top_p: None, tools: vec![] },
    );
    let mut state = HashMap::new();
    state.insert("prefix".to_string(), serde_json::json!("Hello"));
    let steps = vec![
        Step {
            id: "greeting".into(),
            kind: StepKind::Agent {
                agent: "writer".into(),
                prompt: "{{ state.prefix }}, {{ inputs.name }}! Let's discuss {{ inputs.topic }}.".into(),
            },
            condition: None,
            skip_if: None,
            updates: HashMap::new(),
            timeout_ms: None,
        },
        Step {
            id: "follow_up".into(),
            kind: StepKind::Agent {
                agent: "writer".into(),
                prompt: "Based on the greeting: {{ steps.greeting.response }}, continue the conversation about {{ inputs.topic }}.".into(),
            },
            condition: None,
            skip_if: None,
            updates: HashMap::new(),
            timeout_ms: None,
        },
    ];
    let workflow = Workflow {
        version: "1".into(),
        name: None,
        metadata: HashMap::new(),
        agents,
        workflow: WorkflowBody { inputs: serde_json::json!({}), state, steps, outputs: HashMap::new() },
    };
    let (providers, tools, block_executor) = harness().await;
    let config = ExecutorConfig::default();

    let summary = run_workflow(
        &workflow,
        serde_json::json!({"name": "Alice", "topic": "ml"}),
        &providers,
        &tools,
        block_executor,
        &config,
    )
    .await
    .unwrap();

    assert_eq!(summary.status, OverallStatus::Completed);
    let greeting = summary.steps.iter().find(|s| s.step_id == "greeting").unwrap();
    assert_eq!(greeting.response.as_deref(), Some("Hello, Alice! Let's discuss ml."));
    let follow_up = summary.steps.iter().find(|s| s.step_id == "follow_up").unwrap();
    assert!(follow_up
        .response
        .as_deref()
        .unwrap()
        .contains("Based on the greeting: Hello, Alice! Let's discuss ml."));
}
