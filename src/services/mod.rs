pub mod members;
pub mod metrics;
pub mod opportunities;
pub mod signups;
pub mod tenants;
pub mod terminology;
pub mod users;
