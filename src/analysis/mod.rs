pub mod ela;
pub mod recompress;
