pub mod case;
pub mod runner;

pub use case::{FunctionalArgs, InterpCase, Resolved, all_cases, find_case};
pub use runner::{
    CaseReport, RunConfig, case_tensors, compare_outputs, random_input, run_case, run_cases,
};
