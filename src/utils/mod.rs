//! Process, filesystem and git helpers shared by the deploy pipeline.

pub mod exec;
pub mod fs;
pub mod git;
