pub mod prompts;
pub mod table;
