mod config;
mod serve;
mod status;

pub use config::ConfigCommand;
pub use serve::{ServeArgs, build_router};

pub use config::handle_config;
pub use serve::handle_serve;
pub use status::handle_status;
