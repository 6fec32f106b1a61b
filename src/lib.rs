// Condition records and level filters
pub mod condition;

// Per-entity ordered condition log
pub mod store;

// Entity registry and category catalog
pub mod entity;

// Graph aggregate builder
pub mod graph;

// Observed responses and target payloads
pub mod client;

// Verdict taxonomy
pub mod verdict;

// Response verifiers
pub mod verify;

// Configuration
pub mod config;

// Self-check driver and reference target
pub mod simulate;
