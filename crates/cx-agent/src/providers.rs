pub mod agentcore;
pub mod base;
pub mod configs;
pub mod conversation;
pub mod factory;

#[cfg(test)]
pub mod mock;
