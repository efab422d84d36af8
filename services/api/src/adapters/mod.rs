pub mod db;
pub mod gateway;

pub use db::PgSessionStore;
pub use gateway::HttpInferenceGateway;
