//! Orchestration pipeline for building and publishing SOCI indexes.
//!
//! The binary wires an ECR registry client and an external index builder
//! into [`pipeline::Pipeline`], which runs the fixed sequence: validate,
//! acquire a working directory, pull, build or convert, select, push,
//! release. Validation failures skip the run instead of failing it so a
//! batch caller never retries a permanently invalid input.

pub mod cli;
pub mod pipeline;
pub mod trace;
pub mod workdir;
