pub mod commands;
pub mod link;
pub mod package;
pub mod report;
pub mod runtime;
