pub mod dcf;
pub mod stage;
