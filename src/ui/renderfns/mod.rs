pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_footer, MessageLevel};
pub use header::draw_header;
pub use utils::{format_relative, status_color, truncate};
