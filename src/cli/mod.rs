//! Terminal presentation of rates, prices and calculator results.

pub mod calculator;
pub mod dashboard;
pub mod setup;
pub mod ui;
pub mod watch;
