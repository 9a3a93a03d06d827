//! Secret Santa — draw a single gift-giving cycle and email everyone their match.

pub mod config;
pub mod draw;
pub mod error;
pub mod notify;
pub mod participants;
pub mod run;
