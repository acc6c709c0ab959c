pub mod middleware;
pub mod routes;
pub mod services;
