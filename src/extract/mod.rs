pub mod candidate;
pub mod extractor;
pub mod patterns;
