pub mod breadcrumb;
pub mod dialog;
pub mod search;
pub mod status_bar;
pub mod tab_bar;
pub mod tree;
