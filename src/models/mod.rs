pub mod chat;
pub mod detection;
pub mod gemini;
pub mod item;

pub use chat::*;
pub use detection::*;
pub use gemini::*;
pub use item::*;
