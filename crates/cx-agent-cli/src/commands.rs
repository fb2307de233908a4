pub mod feedback;
pub mod session;
