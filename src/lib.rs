pub mod combine;
pub mod extract;
pub mod fetch;
pub mod kinds;
pub mod normalize;
pub mod scrape;
pub mod store;
