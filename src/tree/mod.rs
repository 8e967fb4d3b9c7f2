pub mod cache;
pub mod moves;
pub mod nav;
pub mod path;
pub mod render;
pub mod search;
