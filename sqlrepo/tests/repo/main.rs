#[cfg(feature = "db-tests")]
mod db;

mod caching;
mod cursor;
mod eager;
mod joins;
mod registry;
mod repository;
mod write;
