// ==========================================
// 赞誉量化分配系统 - 核心库
// ==========================================
// 职责: 为每个量化周期把赞誉分配给量化人
// 约束: 每个接收人恰好 K 位量化人、工作量均衡、回避利益冲突
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分箱/冲突消解/校验/编排
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/表结构）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AssignmentMode, PeriodStatus};

// 领域实体
pub use domain::{
    ActionLog, ActionType, AssignmentBin, AssignmentResult, Period, PeriodDetails, PeriodWindow,
    PoolSizeReport, Praise, Quantification, Quantifier, Receiver,
};

// 引擎
pub use engine::{
    AssignmentOrchestrator, AssignmentResolver, AssignmentVerifier, BinConstructor, EngineError,
    EvenPartitioner, QuantifierReplacementService, TargetSizePacker,
};

// API
pub use api::{ApiError, AssignmentApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "赞誉量化分配系统";
