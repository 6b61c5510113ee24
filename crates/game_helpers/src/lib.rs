mod app;
pub use app::*;

pub mod floating_text;
pub mod input;
pub mod storage;

mod window_resizing;
