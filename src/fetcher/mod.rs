pub mod runner;
pub mod fetcher;
pub mod metaverse_fetcher;
