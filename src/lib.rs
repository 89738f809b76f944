pub mod buffers;
pub mod cards;
pub mod cli;
pub mod config;
pub mod display;
pub mod episode;
pub mod error;
pub mod learner;
pub mod network;
pub mod payout;
pub mod play;
pub mod policy;
pub mod simulation;
pub mod strategy;
pub mod table;
pub mod trainer;
