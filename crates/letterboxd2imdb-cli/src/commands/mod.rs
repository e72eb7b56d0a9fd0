pub mod clear;
pub mod progress_ui;
pub mod transfer;
