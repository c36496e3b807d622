// Order settlement pipeline
pub mod execution;

// Quote maintenance from order flow
pub mod pricing;

// Read-side market projections
pub mod ranking;

// Background market drift
pub mod simulation;

// Portfolio mark-to-market
pub mod valuation;
