pub mod account;
pub mod community;
pub mod map;
pub mod reading;
pub mod report;
pub mod score;
pub mod upload;
