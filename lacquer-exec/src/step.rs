//! The step executor (C9) and the agent tool-call loop (4.8).
//!
//! Step execution is a pure function of the current [`ExecutionContext`]
//! and the [`Step`] being run: mark `Running`, evaluate `skip_if`/
//! `condition`, dispatch by kind, write back the outcome.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lacquer_context::{ExecutionContext, StepResolver};
use lacquer_core::{concat_text, partition_tool_use, ContentBlock, ModelMessage, ModelRequest, ProgressSink, Role, SamplingParams, Step, StepKind, TokenUsage, Workflow};
use lacquer_provider::ProviderRegistry;
use lacquer_template::{render, FunctionTable};
use lacquer_tool::{BlockExecutor, ToolRegistry};

use crate::condition::eval_truthy;
use crate::config::ExecutorConfig;
use crate::error::ExecError;
use crate::render::{render_updates, render_with};

/// What a step dispatch produced, before it's folded back into the
/// execution context.
struct StepOutcome {
    output: HashMap<String, serde_json::Value>,
    response: Option<String>,
    token_usage: TokenUsage,
}

/// Run one step to completion against `ctx`, mutating `ctx`'s step result
/// and (on success) its state. Returns `Ok(false)` if the step was
/// skipped, `Ok(true)` if it completed, and `Err` (already recorded into
/// `ctx` as `Failed`) if it failed.
#[allow(clippy::too_many_arguments)]
pub async fn execute_step(
    workflow: &Workflow,
    step: &Step,
    ctx: &ExecutionContext,
    providers: &ProviderRegistry,
    tools: &ToolRegistry,
    block_executor: &Arc<dyn BlockExecutor>,
    functions: &FunctionTable,
    config: &ExecutorConfig,
    sink: &dyn ProgressSink,
) -> Result<bool, ExecError> {
    ctx.mark_step_running(&step.id);
    let resolver = StepResolver::new(ctx, &step.id);

    if let Some(skip_if) = &step.skip_if {
        if eval_truthy(skip_if, &resolver, functions)? {
            ctx.mark_step_skipped(&step.id);
            return Ok(false);
        }
    }
    if let Some(condition) = &step.condition {
        if !eval_truthy(condition, &resolver, functions)? {
            ctx.mark_step_skipped(&step.id);
            return Ok(false);
        }
    }

    let timeout = step.timeout_ms.map(Duration::from_millis).unwrap_or(config.default_timeout);
    let outcome = dispatch(workflow, step, ctx, &resolver, providers, tools, block_executor, functions, config, timeout, sink).await;

    match outcome {
        Ok(outcome) => {
            ctx.mark_step_completed(&step.id, outcome.output, outcome.response, outcome.token_usage);
            let updates = render_updates(&step.updates, &resolver, functions)?;
            ctx.apply_updates(updates);
            Ok(true)
        }
        Err(err) => {
            ctx.mark_step_failed(&step.id, err.to_string());
            Err(err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn dispatch(
    workflow: &Workflow,
    step: &Step,
    ctx: &ExecutionContext,
    resolver: &StepResolver<'_>,
    providers: &ProviderRegistry,
    tools: &ToolRegistry,
    block_executor: &Arc<dyn BlockExecutor>,
    functions: &FunctionTable,
    config: &ExecutorConfig,
    timeout: Duration,
    sink: &dyn ProgressSink,
) -> Result<StepOutcome, ExecError> {
    match &step.kind {
        StepKind::Agent { agent, prompt } => {
            run_agent_step(workflow, agent, prompt, &step.id, ctx, resolver, providers, tools, functions, config, timeout, sink).await
        }
        StepKind::Block { uses, with } => run_block_step(uses, with, resolver, block_executor, functions).await,
        StepKind::Action { action, with } => run_action_step(action, with, resolver, functions),
    }
}

async fn run_block_step(
    uses: &str,
    with: &HashMap<String, serde_json::Value>,
    resolver: &StepResolver<'_>,
    block_executor: &Arc<dyn BlockExecutor>,
    functions: &FunctionTable,
) -> Result<StepOutcome, ExecError> {
    let inputs = render_with(with, resolver, functions)?;
    let result = block_executor.execute(uses, &inputs).await?;
    let output = result.as_object().map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()).unwrap_or_default();
    Ok(StepOutcome { output, response: Some(result.to_string()), token_usage: TokenUsage::default() })
}

fn run_action_step(action: &str, with: &HashMap<String, serde_json::Value>, resolver: &StepResolver<'_>, functions: &FunctionTable) -> Result<StepOutcome, ExecError> {
    match action {
        "update_state" => {
            let rendered = render_with(with, resolver, functions)?;
            let output = rendered.as_object().map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()).unwrap_or_default();
            Ok(StepOutcome { output, response: None, token_usage: TokenUsage::default() })
        }
        "human_input" => {
            let mut output = HashMap::new();
            output.insert("acknowledged".to_string(), serde_json::Value::Bool(true));
            Ok(StepOutcome {
                output,
                response: Some("human input acknowledged".to_string()),
                token_usage: TokenUsage::default(),
            })
        }
        other => Err(ExecError::UnknownAction(other.to_string())),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_agent_step(
    workflow: &Workflow,
    agent_name: &str,
    prompt: &str,
    step_id: &str,
    ctx: &ExecutionContext,
    resolver: &StepResolver<'_>,
    providers: &ProviderRegistry,
    tools: &ToolRegistry,
    functions: &FunctionTable,
    config: &ExecutorConfig,
    timeout: Duration,
    sink: &dyn ProgressSink,
) -> Result<StepOutcome, ExecError> {
    let agent = workflow.agents.get(agent_name).ok_or_else(|| ExecError::NotFound(agent_name.to_string()))?;
    let provider = providers.get(&agent.provider).ok_or_else(|| ExecError::ProviderNotFound(agent.provider.clone()))?;
    if !providers.is_model_supported(&agent.provider, &agent.model).await? {
        return Err(ExecError::ModelNotSupported(format!("{}/{}", agent.provider, agent.model)));
    }

    let rendered_prompt = render(prompt, resolver, functions)?;
    let system_prompt = match &agent.system_prompt {
        Some(tmpl) => Some(render(tmpl, resolver, functions)?),
        None => None,
    };
    let tool_defs = tools.tool_definitions(&agent.tools);
    let sampling = SamplingParams { temperature: agent.temperature, max_tokens: agent.max_tokens, top_p: agent.top_p, stop: Vec::new() };

    let mut messages = vec![ModelMessage::user(rendered_prompt)];
    let mut total_usage = TokenUsage::default();

    for _turn in 0..config.max_tool_turns {
        let request = ModelRequest {
            model: agent.model.clone(),
            messages: messages.clone(),
            system_prompt: system_prompt.clone(),
            sampling: sampling.clone(),
            tools: tool_defs.clone(),
            request_id: format!("{}-{}", ctx.run_id(), messages.len()),
            metadata: HashMap::new(),
        };

        let response = tokio::time::timeout(timeout, provider.generate(&request, ctx, step_id, sink))
            .await
            .map_err(|_| ExecError::StepTimeout(timeout))??;
        total_usage = total_usage + response.usage;

        let (tool_use, rest) = partition_tool_use(response.content.clone());
        if tool_use.is_empty() {
            let mut output = HashMap::new();
            let text = concat_text(&rest);
            output.insert("text".to_string(), serde_json::Value::String(text.clone()));
            return Ok(StepOutcome { output, response: Some(text), token_usage: total_usage });
        }

        messages.push(ModelMessage { role: Role::Assistant, content: response.content });
        let tool_results = execute_tool_calls(&tool_use, tools, ctx, config.tool_call_concurrency).await?;
        messages.push(ModelMessage { role: Role::Tool, content: tool_results });
    }

    Err(ExecError::ToolLoopDepthExceeded(config.max_tool_turns))
}

/// Execute every `ToolUse` block in `tool_use`, preserving order, with at
/// most `concurrency` calls in flight at once (the spec default is 1).
///
/// Each chunk's `join_all` is raced against cancellation so a run cancelled
/// mid tool-call doesn't sit through every in-flight tool invocation.
async fn execute_tool_calls(
    tool_use: &[ContentBlock],
    tools: &ToolRegistry,
    ctx: &ExecutionContext,
    concurrency: usize,
) -> Result<Vec<ContentBlock>, ExecError> {
    let mut results = Vec::with_capacity(tool_use.len());
    for chunk in tool_use.chunks(concurrency.max(1)) {
        let calls = chunk.iter().map(|block| call_one_tool(block, tools, ctx));
        let chunk_results = tokio::select! {
            results = futures_util::future::join_all(calls) => results,
            _ = ctx.cancelled() => return Err(ExecError::WorkflowCancelled),
        };
        results.extend(chunk_results);
    }
    Ok(results)
}

async fn call_one_tool(block: &ContentBlock, tools: &ToolRegistry, ctx: &ExecutionContext) -> ContentBlock {
    let ContentBlock::ToolUse { id, name, input } = block else {
        unreachable!("call_one_tool is only invoked on ToolUse blocks")
    };
    match tools.execute_tool(name, &input.to_string(), ctx).await {
        Ok(result) => ContentBlock::ToolResult { tool_use_id: id.clone(), content: result.content, is_error: result.is_error },
        Err(err) => ContentBlock::ToolResult { tool_use_id: id.clone(), content: err.to_string(), is_error: true },
    }
}
