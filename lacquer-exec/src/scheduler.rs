//! The workflow executor / scheduler (C10): textual dependency discovery
//! plus a bounded-concurrency dispatch loop.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{FuturesUnordered, StreamExt};

use lacquer_context::ExecutionContext;
use lacquer_core::{ExecutionEvent, ExecutionEventKind, ProgressSink, Step, Workflow};
use lacquer_provider::ProviderRegistry;
use lacquer_template::FunctionTable;
use lacquer_tool::{BlockExecutor, ToolRegistry};

use crate::config::ExecutorConfig;
use crate::deps::step_dependencies;
use crate::error::ExecError;
use crate::step::execute_step;

/// Run every step of `workflow` against `ctx` to completion.
///
/// Returns `Ok(())` once the run reaches a terminal status — including
/// `Failed`, which is reported through `ctx.overall_status()`, not as an
/// `Err` here. Only [`ExecError::WorkflowDeadlock`] and
/// [`ExecError::WorkflowCancelled`] are returned as errors, since those are
/// conditions the dispatch loop itself detects rather than step outcomes.
#[allow(clippy::too_many_arguments)]
pub async fn run_workflow(
    workflow: &Workflow,
    ctx: &ExecutionContext,
    providers: &ProviderRegistry,
    tools: &ToolRegistry,
    block_executor: Arc<dyn BlockExecutor>,
    functions: &FunctionTable,
    config: &ExecutorConfig,
    sink: &dyn ProgressSink,
) -> Result<(), ExecError> {
    let run_id = ctx.run_id().as_str().to_string();
    sink.emit(ExecutionEvent::workflow(run_id.clone(), ExecutionEventKind::WorkflowStarted));

    let known_ids: BTreeSet<String> = workflow.workflow.steps.iter().map(|s| s.id.clone()).collect();
    let deps: HashMap<String, BTreeSet<String>> =
        workflow.workflow.steps.iter().map(|s| (s.id.clone(), step_dependencies(s, &known_ids))).collect();

    let total = workflow.workflow.steps.len();
    let mut completed: HashSet<String> = HashSet::new();
    let mut executing: HashSet<String> = HashSet::new();
    let mut errors: HashMap<String, String> = HashMap::new();
    let cap = config.max_concurrent_steps.max(1);
    let sequential = cap == 1;

    let mut in_flight: FuturesUnordered<_> = FuturesUnordered::new();

    let outcome = 'dispatch: loop {
        if ctx.is_cancelled() {
            break 'dispatch Err(ExecError::WorkflowCancelled);
        }
        if completed.len() + errors.len() == total {
            break 'dispatch Ok(());
        }

        let ready: Vec<&Step> = workflow
            .workflow
            .steps
            .iter()
            .filter(|s| !completed.contains(&s.id) && !errors.contains_key(&s.id) && !executing.contains(&s.id))
            .filter(|s| deps[&s.id].iter().all(|d| completed.contains(d)))
            .collect();

        if ready.is_empty() && executing.is_empty() {
            if errors.is_empty() {
                let stuck: Vec<String> = workflow
                    .workflow
                    .steps
                    .iter()
                    .filter(|s| !completed.contains(&s.id) && !errors.contains_key(&s.id))
                    .map(|s| s.id.clone())
                    .collect();
                break 'dispatch Err(ExecError::WorkflowDeadlock(stuck));
            }
            // Nothing left ready, nothing executing, at least one failure
            // already recorded: drain without starting unschedulable
            // dependents.
            break 'dispatch Ok(());
        }

        let slots = cap.saturating_sub(executing.len());
        for step in ready.into_iter().take(slots) {
            executing.insert(step.id.clone());
            let step_index = ctx.step_index(&step.id).unwrap_or(0);
            in_flight.push(run_one(
                step,
                workflow,
                ctx,
                providers,
                tools,
                &block_executor,
                functions,
                config,
                &run_id,
                step_index,
                sink,
            ));
        }

        if let Some((step_id, result)) = in_flight.next().await {
            executing.remove(&step_id);
            let failed = result.is_err();
            match result {
                Ok(_) => {
                    completed.insert(step_id);
                }
                Err(err) => {
                    errors.insert(step_id, err.to_string());
                }
            }
            if sequential && failed {
                break 'dispatch Ok(());
            }
        }
    };

    ctx.mark_workflow_completed();
    match &outcome {
        Ok(()) if errors.is_empty() => {
            sink.emit(ExecutionEvent::workflow(run_id, ExecutionEventKind::WorkflowCompleted));
        }
        _ => {
            sink.emit(ExecutionEvent::workflow(run_id, ExecutionEventKind::WorkflowFailed));
        }
    }
    outcome
}

#[allow(clippy::too_many_arguments)]
async fn run_one<'a>(
    step: &'a Step,
    workflow: &'a Workflow,
    ctx: &'a ExecutionContext,
    providers: &'a ProviderRegistry,
    tools: &'a ToolRegistry,
    block_executor: &'a Arc<dyn BlockExecutor>,
    functions: &'a FunctionTable,
    config: &'a ExecutorConfig,
    run_id: &'a str,
    step_index: usize,
    sink: &'a dyn ProgressSink,
) -> (String, Result<bool, ExecError>) {
    sink.emit(ExecutionEvent::step(run_id.to_string(), step.id.clone(), step_index, ExecutionEventKind::StepStarted));
    let start = Instant::now();
    let result = execute_step(workflow, step, ctx, providers, tools, block_executor, functions, config, sink).await;
    let duration = start.elapsed();

    let event = match &result {
        Ok(true) => ExecutionEvent::step(run_id.to_string(), step.id.clone(), step_index, ExecutionEventKind::StepCompleted).with_duration(duration),
        Ok(false) => ExecutionEvent::step(run_id.to_string(), step.id.clone(), step_index, ExecutionEventKind::StepSkipped).with_duration(duration),
        Err(err) => ExecutionEvent::step(run_id.to_string(), step.id.clone(), step_index, ExecutionEventKind::StepFailed)
            .with_duration(duration)
            .with_error(err.to_string()),
    };
    sink.emit(event);

    (step.id.clone(), result)
}
