pub mod chat_history;
pub mod document;
pub mod image;
pub mod role;
pub mod synthetic_user;
pub mod token_count;
pub mod topic;
pub mod usage;
