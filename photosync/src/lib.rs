pub mod change;
pub mod context;
pub mod error;
pub mod fetch;
pub mod hook;
pub mod metadata;
pub mod path;
pub mod retained;
pub mod run;
pub mod sanitize;
pub mod scrub;
pub mod util;
pub mod window;

#[cfg(test)]
mod tests;
