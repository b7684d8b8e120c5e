pub mod document;
#[cfg(test)]
pub mod fixtures;
