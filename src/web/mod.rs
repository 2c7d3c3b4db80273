//! Browser front end: router, handlers and page rendering.

mod form;
mod handlers;
mod page;
mod server;
mod state;

pub use form::read_form;
pub use handlers::HealthResponse;
pub use page::{escape_html, is_renderable_url, render, Notice, PageView};
pub use server::{create_router, serve, ServeError};
pub use state::AppState;
