pub mod catalog;
pub mod maintenance;
pub mod normalize;
pub mod parts_service;
pub mod scraping;
pub mod specs;
