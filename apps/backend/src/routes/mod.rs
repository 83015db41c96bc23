pub mod auth;
pub mod cards;
pub mod leaderboard;
pub mod quiz;
pub mod session;
pub mod sets;
pub mod stats;
pub mod study;
pub mod users;
