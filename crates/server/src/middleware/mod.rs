//! Request extractors and middleware.

pub mod company;

pub use company::Company;
