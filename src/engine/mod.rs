pub mod cancel;
pub mod extract;
pub mod http;
pub mod matcher;
pub mod params;
pub mod runner;
