pub mod db;
pub mod idea_llm;

pub use db::DbAdapter;
pub use idea_llm::OpenAiIdeaAdapter;
