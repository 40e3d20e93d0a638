//! RAII guards for run lifecycle reporting.

mod run_guard;

pub use run_guard::RunGuard;
