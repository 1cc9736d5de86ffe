pub mod alerts;
pub mod poll;
