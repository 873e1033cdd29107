/// Per-instruction driver.
pub mod processor;
