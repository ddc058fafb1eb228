//! The windowed Top-K frequency structure

mod topk;

pub use topk::{TopItem, TopkSketch};
