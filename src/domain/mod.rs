// Domain-specific error types
pub mod errors;

// Feature engineering, estimators and evaluation
pub mod ml;

// Flat records, calendar positions and trained artifacts
pub mod pricing;

// Storage and data source abstractions
pub mod repositories;
