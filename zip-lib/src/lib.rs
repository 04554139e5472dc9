//! Field validators shared by the zipapi server and its tooling.

pub mod validators;
