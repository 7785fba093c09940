pub mod domain;
pub mod plan;
pub mod ports;

pub use domain::{
    LearningPlan, NewTopic, NewUser, PlanRequest, PlanVideo, Topic, TopicProgress,
    TopicResources, User,
};
pub use plan::{build_plan_prompt, parse_plan_response};
pub use ports::{LearningStore, PlanGenerationService, PortError, PortResult};
