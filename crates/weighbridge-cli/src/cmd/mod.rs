pub mod add;
pub mod completions;
pub mod edit;
pub mod list;
pub mod options;
pub mod show;
