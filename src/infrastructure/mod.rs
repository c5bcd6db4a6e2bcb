pub mod browser;
pub mod process;

pub use browser::{file_url, probe_browser, BrowserSession};
pub use process::{remove_partial_output, ToolCommand};
