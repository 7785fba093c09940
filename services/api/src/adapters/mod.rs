pub mod json_store;
pub mod plan_llm;

pub use json_store::JsonFileStore;
pub use plan_llm::GeminiPlanAdapter;
