pub mod check_result;

pub use check_result::{CheckResult, CheckStatus};
