pub mod file;
pub mod http;
pub mod memory;

pub use file::FileParameterStore;
pub use http::HttpParameterStore;
pub use memory::MemoryParameterStore;
