pub mod aggregate;
pub mod config;
pub mod format;
pub mod observability;
pub mod ranking;
pub mod search;
pub mod source;
pub mod store;
pub mod types;
pub mod window;

#[cfg(test)]
mod test_support;
