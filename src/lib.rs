pub mod cli;
pub mod core;
pub mod google;
pub mod output;
pub mod team;
pub mod timerange;
