pub mod blog;
pub mod ui;
