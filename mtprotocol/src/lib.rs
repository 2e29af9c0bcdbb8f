#[macro_use]
extern crate serde_derive;

pub mod constants;
pub mod content;
pub mod messages;
pub mod search;
