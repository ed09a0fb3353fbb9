pub mod footer;
pub mod header;
pub mod log_view;
pub mod render;
pub mod spinner;
pub mod tree;
