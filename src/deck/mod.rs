pub mod composer;
pub mod contents;
pub mod format_rules;
pub mod grouping;
pub mod notices;
pub mod state;
