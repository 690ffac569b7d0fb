//! Terminal display and formatting utilities.
//!
//! Handles colorized JSON output and claim-by-claim token reports for
//! human-readable terminal output.

pub mod json_printer;
pub mod token_report;
