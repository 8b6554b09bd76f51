#![deny(missing_docs)]
//! # lacquer-provider-cli
//!
//! Implements [`lacquer_provider::ModelProvider`] for the local "claude-code"
//! CLI: each `generate` call spawns the executable, streams NDJSON lines off
//! its stdout, and reassembles them into a uniform [`ModelResponse`].
//!
//! Unlike the HTTP providers this crate has no persistent connection to
//! close and no status codes to classify retryability from — see
//! [`error::classify_io_error`] for the substring-based fallback.

mod config;
mod error;
mod protocol;

pub use config::{resolve_executable, CliConfig, CANDIDATE_EXECUTABLES};

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

use error::classify_io_error;
use lacquer_context::ExecutionContext;
use lacquer_core::{
    concat_text, ContentBlock, ExecutionEvent, ExecutionEventKind, ModelRequest, ProgressSink, Role, TokenUsage,
};
use lacquer_provider::{ModelInfo, ModelProvider, ModelResponse, ProviderError, StopReason};
use protocol::{estimate_tokens, pair_tool_calls, CliLine};

/// Name this provider registers under (`Agent::provider` in a workflow).
pub const PROVIDER_NAME: &str = "cli";

/// Local CLI subprocess provider.
pub struct CliProvider {
    config: CliConfig,
}

/// Decide what, if anything, to tell the progress sink about one NDJSON
/// line already classified as `label` (`"system"` or `"assistant"`).
/// `detail` is the line's assistant text, when there is any.
///
/// Returns `None` when `show_progress` is off. When `enable_streaming` is
/// off, the event still fires but without `detail` attached — the CLI
/// provider surfaces that a line arrived without surfacing its content.
fn progress_event_for_line(
    run_id: &str,
    step_id: &str,
    label: &str,
    detail: Option<&str>,
    show_progress: bool,
    enable_streaming: bool,
) -> Option<ExecutionEvent> {
    if !show_progress {
        return None;
    }
    let event = ExecutionEvent::step(run_id, step_id, 0, ExecutionEventKind::StepProgress).with_metadata("kind", label);
    let event = match (enable_streaming, detail) {
        (true, Some(text)) if !text.is_empty() => event.with_metadata("text", text),
        _ => event,
    };
    Some(event)
}

impl CliProvider {
    /// Build a provider from explicit configuration. The executable isn't
    /// resolved until the first call, so a provider can be constructed even
    /// when the CLI isn't installed yet.
    pub fn new(config: CliConfig) -> Self {
        Self { config }
    }

    fn build_prompt(&self, request: &ModelRequest) -> String {
        let mut out = String::new();
        if let Some(system) = &request.system_prompt {
            out.push_str(system);
            out.push_str("\n\n");
        }
        for message in &request.messages {
            let text = concat_text(&message.content);
            if text.is_empty() {
                continue;
            }
            let role = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
                Role::Tool => "Tool",
            };
            out.push_str(role);
            out.push_str(": ");
            out.push_str(&text);
            out.push('\n');
        }
        out
    }

    async fn run_once(
        &self,
        request: &ModelRequest,
        ctx: &ExecutionContext,
        step_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ModelResponse, ProviderError> {
        let executable = resolve_executable(&self.config).map_err(ProviderError::RequestFailed)?;
        let prompt = self.build_prompt(request);
        let model = if request.model.is_empty() { self.config.model.clone() } else { request.model.clone() };

        let mut child = Command::new(&executable)
            .arg("--print")
            .arg(&prompt)
            .arg("--output-format")
            .arg("stream-json")
            .arg("--model")
            .arg(&model)
            .current_dir(&self.config.working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| classify_io_error(&e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProviderError::RequestFailed("subprocess stdout was not captured".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();

        let read_loop = async {
            let mut content: Vec<ContentBlock> = Vec::new();
            loop {
                let line = lines.next_line().await.map_err(|e| classify_io_error(&e))?;
                let Some(line) = line else {
                    return Err(ProviderError::InvalidResponse(
                        "subprocess closed stdout without a result message".to_string(),
                    ));
                };
                if line.trim().is_empty() {
                    continue;
                }
                let parsed: CliLine = serde_json::from_str(&line)
                    .map_err(|e| ProviderError::InvalidResponse(format!("malformed NDJSON line: {e}")))?;
                match parsed {
                    CliLine::System { subtype } => {
                        if let Some(event) = progress_event_for_line(
                            ctx.run_id().as_str(),
                            step_id,
                            "system",
                            subtype.as_deref(),
                            self.config.show_progress,
                            self.config.enable_streaming,
                        ) {
                            sink.emit(event);
                        }
                    }
                    CliLine::Assistant { message } => {
                        let blocks = pair_tool_calls(message.content);
                        if let Some(event) = progress_event_for_line(
                            ctx.run_id().as_str(),
                            step_id,
                            "assistant",
                            Some(&concat_text(&blocks)),
                            self.config.show_progress,
                            self.config.enable_streaming,
                        ) {
                            sink.emit(event);
                        }
                        content.extend(blocks);
                    }
                    CliLine::Result { duration_ms, is_error, usage, result, .. } => {
                        if content.is_empty() {
                            if let Some(text) = result {
                                content.push(ContentBlock::Text { text });
                            }
                        }
                        return Ok((content, duration_ms, is_error, usage));
                    }
                }
            }
        };

        // Raced against both the session timeout and run cancellation, so a
        // cancelled workflow doesn't wait out a long-lived subprocess.
        let read_result = tokio::select! {
            result = timeout(self.config.session_timeout, read_loop) => result,
            _ = ctx.cancelled() => {
                let _ = child.start_kill();
                return Err(ProviderError::RequestFailed("cancelled".to_string()));
            }
        };

        let (content, duration_ms, is_error, usage) = match read_result {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => {
                let _ = child.start_kill();
                return Err(e);
            }
            Err(_) => {
                let _ = child.start_kill();
                return Err(ProviderError::RequestFailed(format!(
                    "subprocess exceeded session_timeout of {:?}",
                    self.config.session_timeout
                )));
            }
        };
        let _ = child.wait().await;

        if is_error == Some(true) {
            return Err(ProviderError::RequestFailed(
                "CLI result message reported is_error".to_string(),
            ));
        }

        let usage = match usage {
            Some(u) => TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            },
            None => {
                let prompt_tokens = estimate_tokens(prompt.len());
                let completion_tokens = estimate_tokens(concat_text(&content).len());
                TokenUsage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: prompt_tokens + completion_tokens,
                }
            }
        };

        tracing::debug!(?duration_ms, "cli subprocess exchange completed");

        let stop_reason = if content.iter().any(ContentBlock::is_tool_use) {
            StopReason::ToolUse
        } else {
            StopReason::EndTurn
        };

        Ok(ModelResponse { content, stop_reason, usage, model })
    }
}

#[async_trait]
impl ModelProvider for CliProvider {
    async fn generate(
        &self,
        request: &ModelRequest,
        ctx: &ExecutionContext,
        step_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ModelResponse, ProviderError> {
        // No internal retry loop: a failed subprocess exchange is never
        // automatically retried, so there's no `StepRetrying` event to emit.
        self.run_once(request, ctx, step_id, sink).await
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        Ok(["sonnet", "opus", "haiku"]
            .into_iter()
            .map(|id| ModelInfo { id: id.to_string(), display_name: id.to_string(), context_window: None })
            .collect())
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lacquer_core::{ModelMessage, SamplingParams};

    fn request() -> ModelRequest {
        ModelRequest {
            model: String::new(),
            messages: vec![ModelMessage::user("hi")],
            system_prompt: Some("be terse".into()),
            sampling: SamplingParams::default(),
            tools: vec![],
            request_id: "r1".into(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn build_prompt_prepends_the_system_prompt() {
        let provider = CliProvider::new(CliConfig::default());
        let prompt = provider.build_prompt(&request());
        assert!(prompt.starts_with("be terse"));
        assert!(prompt.contains("User: hi"));
    }

    #[tokio::test]
    async fn list_models_returns_the_known_aliases() {
        let provider = CliProvider::new(CliConfig::default());
        let models = provider.list_models().await.unwrap();
        assert!(models.iter().any(|m| m.id == "sonnet"));
    }

    #[test]
    fn progress_disabled_emits_nothing() {
        let event = progress_event_for_line("run-1", "s1", "assistant", Some("hi"), false, true);
        assert!(event.is_none());
    }

    #[test]
    fn streaming_enabled_attaches_the_line_text() {
        let event = progress_event_for_line("run-1", "s1", "assistant", Some("hi there"), true, true).unwrap();
        assert_eq!(event.kind, ExecutionEventKind::StepProgress);
        assert_eq!(event.metadata.get("kind").unwrap(), "assistant");
        assert_eq!(event.metadata.get("text").unwrap(), "hi there");
    }

    #[test]
    fn streaming_disabled_still_emits_but_without_text() {
        let event = progress_event_for_line("run-1", "s1", "assistant", Some("hi there"), true, false).unwrap();
        assert_eq!(event.metadata.get("kind").unwrap(), "assistant");
        assert!(event.metadata.get("text").is_none());
    }
}
