pub mod dashboard;
pub mod fresh_data;
