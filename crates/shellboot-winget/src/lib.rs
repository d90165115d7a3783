mod backend;
mod detection;
mod table;

pub use backend::WingetManager;
pub use detection::detect_winget;
pub use table::parse_list_output;
