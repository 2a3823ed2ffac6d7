//! HTTP route handlers

pub mod metrics;
pub mod ping;
pub mod predict;

#[cfg(test)]
pub(crate) mod test_support;
