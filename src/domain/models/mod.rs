pub mod config;
pub mod expertise_area;
pub mod reporting;
pub mod signals;
pub mod statistics;
pub mod task;
pub mod user;

pub use config::{
    CompatibilityConfig, CompatibilityWeights, Config, DatabaseConfig, ExpertiseConfig,
    LoggingConfig, DEFAULT_COMPATIBILITY_THRESHOLD,
};
pub use expertise_area::{
    slugify, ExpertiseArea, ExpertiseAreaNode, ExpertiseAreaUpdate, NewExpertiseArea,
};
pub use reporting::{
    GlobalAverages, PublisherActivity, PublisherSummary, ReportPeriod, DEFAULT_REPORT_DAYS,
    MAX_REPORT_DAYS,
};
pub use signals::{BrowsingPattern, GeoLocation, LanguageDetection, SignalOutcome, UserSignals};
pub use statistics::{StatisticsOwner, TaskEvent, UserStatistics};
pub use task::{
    AdvancementDecision, CompatibilityResult, FactorScores, LevelRecommendation, ScoredTask,
    TaskDescriptor,
};
pub use user::{short_id, UserFacts, UserKind, UserProfile, UserSession, UserSnapshot};
