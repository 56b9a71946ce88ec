pub mod common;
pub mod dump;
pub mod generate;
pub mod info;
