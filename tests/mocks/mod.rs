//! Mock implementations for testing without network access.
//!
//! `MockHttp` replays canned responses (optionally delayed, to force a
//! completion order), and the mock checkers turn those responses into
//! verdicts through the public `Checker` trait.


pub use checkers::*;
pub use transport::*;
