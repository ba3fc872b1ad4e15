pub mod actions;
pub mod fetch;
pub mod locking;
pub mod reducer;
pub mod resolvers;
pub mod selectors;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;
