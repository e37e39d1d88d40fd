pub mod assistant;
pub mod banner;
pub mod color;
pub mod completer;
pub mod highlighter;
pub mod prompt;
