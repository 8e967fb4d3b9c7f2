pub mod api;
#[cfg(test)]
pub mod mock;
pub mod types;
