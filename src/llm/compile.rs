//! Prompt compiler: `GenerationRequest` → `CompiledPrompt`.
//!
//! Pure and deterministic: no clock, no randomness, no I/O. Equal requests
//! compile to byte-identical prompts, which the result cache relies on.

use super::error::GenerationError;
use super::hashtags;
use super::prompts::{self, Voice};
use super::prompts_task;
use super::schema::{Field, SchemaDescriptor};
use super::types::{CompiledPrompt, GenerationRequest, OperationKind, OutputContract};

/// Compile a request into system instruction, task prompt and schema.
///
/// Fails only when a regeneration kind arrives without a prior article.
pub fn compile(request: &GenerationRequest) -> Result<CompiledPrompt, GenerationError> {
    let settings = &request.settings;
    let context = request.effective_context();

    let (system_instruction, task_prompt) = match request.operation {
        OperationKind::Full => (
            prompts::build_system_instruction(Voice::of(settings), true),
            prompts_task::build_full_task(&request.source_text, context, settings),
        ),
        OperationKind::Titles => (
            prompts::build_system_instruction(Voice::of(settings), false),
            prompts_task::build_titles_task(prior_article(request)?, request.title_count(), settings),
        ),
        OperationKind::Hashtags => (
            prompts::build_system_instruction(Voice::neutral(settings.goal), false),
            prompts_task::build_hashtags_task(prior_article(request)?, settings),
        ),
        OperationKind::Article => (
            prompts::build_system_instruction(Voice::of(settings), true),
            prompts_task::build_article_task(
                &request.source_text,
                context,
                prior_article(request)?,
                settings,
            ),
        ),
    };

    let schema = SchemaDescriptor::for_operation(request.operation);
    let contract = OutputContract {
        title_count: schema
            .declares(Field::Titles)
            .then(|| request.title_count()),
        source_hashtags: hashtags::find_tokens(&request.source_text),
    };

    log::debug!(
        "[COMPILE] {} system {} chars, task {} chars",
        request.operation.as_str(),
        system_instruction.len(),
        task_prompt.len()
    );

    Ok(CompiledPrompt {
        operation: request.operation,
        system_instruction,
        task_prompt,
        schema,
        contract,
    })
}

fn prior_article(request: &GenerationRequest) -> Result<&str, GenerationError> {
    request
        .prior_article
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or(GenerationError::MissingPriorArticle)
}
