pub mod env;
pub mod tracing_init;
pub mod window;

pub use env::AppConfig;
pub use tracing_init::init_tracing;
pub use window::DateWindow;
