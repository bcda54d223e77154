//! One chat turn: assemble context, call the backend, absorb failures.

use tracing::warn;

use crate::context::assemble_context;
use crate::generation::{GenerationClient, GenerationResponse, RetrievedSource};
use crate::library::LibraryManager;
use crate::models::Attachment;

/// Shown in place of generated text when the backend call fails for any
/// reason. The failed turn is not retried and never touches the library.
pub const GENERATION_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while generating a response. Please try again.";

/// Result of a chat turn as it lands in the transcript.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub text: String,
    pub retrieval: Vec<RetrievedSource>,
    pub failed: bool,
}

/// Run one chat turn against the active group.
///
/// Context assembly completes fully before the outbound request is issued;
/// there is no partial or streaming submission. Generation failure resolves
/// the turn with [`GENERATION_FAILURE_MESSAGE`] instead of propagating.
pub async fn run_turn(
    manager: &LibraryManager,
    client: &dyn GenerationClient,
    prompt: &str,
    extra_attachments: Vec<Attachment>,
) -> TurnOutcome {
    let group = manager.active_group();
    let context = assemble_context(group, extra_attachments, manager.store().as_ref()).await;

    match client
        .generate(prompt, &context.urls, &context.attachments)
        .await
    {
        Ok(GenerationResponse { text, retrieval }) => TurnOutcome {
            text,
            retrieval,
            failed: false,
        },
        Err(e) => {
            warn!(error = %e, "generation failed, resolving turn with fallback message");
            TurnOutcome {
                text: GENERATION_FAILURE_MESSAGE.to_string(),
                retrieval: Vec::new(),
                failed: true,
            }
        }
    }
}
