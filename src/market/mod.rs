pub mod feed;
pub mod model;
pub mod query;
pub mod view;
