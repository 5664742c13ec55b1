pub mod logging;
pub mod template;
