pub mod category;
pub mod error;
pub mod id;
pub mod ingredient;
pub mod operation;
pub mod recipe;
pub mod unit;
pub mod user;

pub use error::{Error, Result};
