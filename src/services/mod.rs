//! Domain services: the scoring engine and the operations built on it.

pub mod compatibility_scorer;
pub mod expertise_area_service;
pub mod expertise_level;
pub mod profile_service;
pub mod profiler_service;
pub mod staircase;
pub mod statistics_service;
pub mod task_compatibility_service;
pub mod task_ranker;
pub mod user_directory;

pub use compatibility_scorer::CompatibilityScorer;
pub use expertise_area_service::ExpertiseAreaService;
pub use expertise_level::ExpertiseLevelCalculator;
pub use profile_service::{ProfileService, MAX_TOP_CONTRIBUTORS, VERIFICATION_MIN_TASKS};
pub use profiler_service::{detect_language, infer_expertise_areas, ProfilerService};
pub use staircase::{challenge_interval, StaircasePolicy};
pub use statistics_service::StatisticsService;
pub use task_compatibility_service::TaskCompatibilityService;
pub use task_ranker::TaskRanker;
pub use user_directory::{ResolvedUser, UserDirectory};
