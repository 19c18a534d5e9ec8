pub mod error;
pub mod handlers;
pub mod router;
#[cfg(test)]
mod tests;
