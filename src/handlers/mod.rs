mod directory_listing;
mod get_path;
mod range;

pub use directory_listing::render_listing;
pub use get_path::{get_path, get_root};
pub use range::{ByteRange, parse_range};
