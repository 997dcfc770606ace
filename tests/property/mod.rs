//! Property-based tests for selection purity and queue ordering

mod determinism;
