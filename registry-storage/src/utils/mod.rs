pub mod cli;
pub mod validation;
