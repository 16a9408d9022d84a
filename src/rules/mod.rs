pub mod loader;
pub mod manager;
pub mod model;

pub use loader::RuleLoader;
pub use model::{Category, Rule, RuleDatabase, RuleType};
