//! Port trait definitions (Hexagonal Architecture)
//!
//! Repository contracts the services depend on. The SQLite adapters in
//! `crate::adapters::sqlite` implement them; tests may substitute their own.

pub mod expertise_area_repository;
pub mod profile_repository;
pub mod publisher_statistics_repository;
pub mod session_repository;
pub mod statistics_repository;

pub use expertise_area_repository::ExpertiseAreaRepository;
pub use profile_repository::ProfileRepository;
pub use publisher_statistics_repository::PublisherStatisticsRepository;
pub use session_repository::SessionRepository;
pub use statistics_repository::StatisticsRepository;
