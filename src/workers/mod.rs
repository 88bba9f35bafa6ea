//! 工作器集合
//!
//! 内置七个工作器，对应默认计划的全部工具名：
//! narrative、userReview、model、review、usecase、mvc、scenario。
//! 生成逻辑都委托给 agents 中注入的协作方，这里只做编排语义。

pub mod model;
pub mod mvc;
pub mod narrative;
pub mod registry;
pub mod review;
pub mod scenario;
pub mod usecase;
pub mod user_review;

pub use model::ModelWorker;
pub use mvc::MvcWorker;
pub use narrative::NarrativeWorker;
pub use registry::{StepOutcome, Worker, WorkerRegistry};
pub use review::ReviewWorker;
pub use scenario::ScenarioWorker;
pub use usecase::UseCaseWorker;
pub use user_review::UserReviewWorker;
