pub mod apply;
pub mod select;
