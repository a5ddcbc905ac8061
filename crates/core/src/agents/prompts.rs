//! Default system instructions bundled at compile time.
//!
//! Each agent appends the JSON Schema of its output shape, so the prompt text
//! stays about the task and the schema stays in sync with the types.

use schemars::JsonSchema;

pub const INTENT_CLASSIFIER: &str = include_str!("defaults/intent_classifier.md");
pub const VISUALIZER: &str = include_str!("defaults/visualizer.md");
pub const PERSONALIZATION: &str = include_str!("defaults/personalization.md");
pub const SCAFFOLDER: &str = include_str!("defaults/scaffolder.md");
pub const KNOWLEDGE_MANAGER: &str = include_str!("defaults/knowledge_manager.md");
pub const EVALUATOR: &str = include_str!("defaults/evaluator.md");
pub const FEEDBACK: &str = include_str!("defaults/feedback.md");
pub const ANALOGY: &str = include_str!("defaults/analogy.md");
pub const FLASHCARDS: &str = include_str!("defaults/flashcards.md");
pub const CHEAT_SHEET: &str = include_str!("defaults/cheat_sheet.md");
pub const RESOURCES: &str = include_str!("defaults/resources.md");
pub const PARETO: &str = include_str!("defaults/pareto.md");
pub const QUIZ: &str = include_str!("defaults/quiz.md");
pub const MNEMONIC: &str = include_str!("defaults/mnemonic.md");

/// All default prompts with their agent ids
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("intent_classifier", INTENT_CLASSIFIER),
        ("visualizer", VISUALIZER),
        ("personalization", PERSONALIZATION),
        ("scaffolder", SCAFFOLDER),
        ("knowledge_manager", KNOWLEDGE_MANAGER),
        ("evaluator", EVALUATOR),
        ("feedback", FEEDBACK),
        ("h1_analogy", ANALOGY),
        ("h2_flashcards", FLASHCARDS),
        ("h3_cheatsheet", CHEAT_SHEET),
        ("h4_resources", RESOURCES),
        ("h5_pareto", PARETO),
        ("h6_quiz", QUIZ),
        ("h8_mnemonic", MNEMONIC),
    ]
}

/// `base` followed by the output schema of `T`.
pub fn with_schema<T: JsonSchema>(base: &str) -> String {
    let schema = schemars::schema_for!(T);
    let schema = serde_json::to_string_pretty(&schema).unwrap_or_default();
    format!(
        "{}\n\n## Output\n\nRespond with STRICT JSON matching this schema, inside a ```json fence:\n\n```json\n{}\n```\n",
        base.trim_end(),
        schema
    )
}
