pub mod page_renderer;
pub mod route_path;

pub use page_renderer::{ChromeRenderer, RenderOutcome, RouteRenderer};
pub use route_path::{map_route_to_path, write_route_file};
