// ==========================================
// 赞誉量化分配系统 - 引擎层
// ==========================================
// 职责: 分箱、冲突消解、校验、编排、替换
// 红线: Engine 不拼 SQL, 存储访问全部经由 Repository
// ==========================================

pub mod bins;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod replacement;
pub mod repositories;
pub mod resolver;
pub mod verifier;

// 重导出核心引擎
pub use bins::{constructor_for, BinConstructor, EvenPartitioner, TargetSizePacker};
pub use error::{EngineError, EngineResult};
pub use locks::PeriodLocks;
pub use orchestrator::{AssignmentInputs, AssignmentOrchestrator, AssignmentSummary, DryRunOutcome};
pub use replacement::{QuantifierReplacementService, ReplaceQuantifierRequest, ReplacementOutcome};
pub use repositories::AssignmentRepositories;
pub use resolver::{AssignmentResolver, ResolverState};
pub use verifier::AssignmentVerifier;
