pub mod read;
#[cfg(any(test, feature = "test-support"))]
pub mod write;
