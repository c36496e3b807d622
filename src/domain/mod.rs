// Core trading domain
pub mod trading;

// Repository traits
pub mod repositories;

// Domain-specific error types
pub mod errors;
