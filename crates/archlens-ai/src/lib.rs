pub mod engine;
pub mod fallback;
pub mod llm_provider;
pub mod openai_compatible;
pub mod prompt;
pub mod verify;

pub use engine::{AnalysisReport, ArchEngine, GraphStats, Outcome};
pub use fallback::{build_fallback_answer, pick_first_cycle_and_edge, CyclePick};
pub use llm_provider::{GenerationConfig, LlmProvider, LlmResponse, LlmResult, Message, MessageRole};
pub use openai_compatible::OpenAiCompatibleProvider;
pub use prompt::{build_architecture_prompt, DEFAULT_ARCH_QUERY};
pub use verify::{collect_allowed_packages, collect_valid_ids, ResponseVerifier, NEW_MARKER, REQUIRED_HEADINGS};
