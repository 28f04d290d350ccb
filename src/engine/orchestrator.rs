// ==========================================
// 赞誉量化分配系统 - 分配编排器
// ==========================================
// 用途: 协调 分箱 → 冲突消解 → 校验 的试算流程，并负责提交
// 状态机: OPEN → QUANTIFY → CLOSED
// ==========================================
// 流程:
// 1. 前置条件: 周期为 OPEN 且窗口内无量化记录
// 2. 试算: 最多 max_attempts 次，每次重新打乱，取首个无剩余的结果
// 3. 全部失败: 返回分配不足，不写入任何量化记录
// 4. 成功: 每个 (赞誉, 量化人) 写入一条中性量化记录，周期迁移到 QUANTIFY
// ==========================================

use crate::config::{AssignmentConfigReader, AssignmentSettings};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::assignment::{AssignmentResult, PoolSizeReport};
use crate::domain::period::{Period, PeriodWindow};
use crate::domain::praise::{Quantification, Receiver};
use crate::domain::quantifier::Quantifier;
use crate::domain::types::{AssignmentMode, PeriodStatus};
use crate::engine::bins::constructor_for;
use crate::engine::error::{from_commit_error, EngineError, EngineResult};
use crate::engine::locks::PeriodLocks;
use crate::engine::repositories::AssignmentRepositories;
use crate::engine::resolver::AssignmentResolver;
use crate::engine::verifier::AssignmentVerifier;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ==========================================
// DryRunOutcome - 试算结果
// ==========================================
#[derive(Debug, Clone)]
pub struct DryRunOutcome {
    pub result: AssignmentResult,      // 成功时为首个完整结果，否则为剩余最少的一次
    pub attempts: usize,               // 实际试算次数
    pub settings: AssignmentSettings,
}

// ==========================================
// AssignmentSummary - 提交结果摘要
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub period_id: String,
    pub mode: AssignmentMode,
    pub attempts: usize,
    pub quantifier_count: usize,     // 领取到工作的量化人数
    pub quantification_count: usize, // 写入的量化记录数
}

// ==========================================
// AssignmentInputs - 单周期试算输入
// ==========================================
#[derive(Debug, Clone)]
pub struct AssignmentInputs {
    pub period: Period,
    pub window: PeriodWindow,
    pub receivers: Vec<Receiver>,
    pub pool: Vec<Quantifier>,
    pub window_praise_count: i64,
    pub settings: AssignmentSettings,
}

// ==========================================
// AssignmentOrchestrator - 分配编排器
// ==========================================
pub struct AssignmentOrchestrator<C>
where
    C: AssignmentConfigReader,
{
    config: Arc<C>,
    repos: AssignmentRepositories,
    locks: Arc<PeriodLocks>,
    seed: Option<u64>,
}

impl<C> AssignmentOrchestrator<C>
where
    C: AssignmentConfigReader,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - repos: 仓储集合
    /// - locks: 周期锁（与替换服务共享）
    pub fn new(config: Arc<C>, repos: AssignmentRepositories, locks: Arc<PeriodLocks>) -> Self {
        Self {
            config,
            repos,
            locks,
            seed: None,
        }
    }

    /// 固定随机种子（测试用）
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn make_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    // ==========================================
    // 试算（纯计算，不访问存储）
    // ==========================================

    /// 执行最多 max_attempts 次试算
    ///
    /// # 返回
    /// - Ok(outcome): outcome.result.is_complete() 表示成功
    /// - Err(前置条件): 均分模式的池规模/接收人数不满足
    /// - Err(InvariantViolation): 校验失败，立即中止
    pub fn dry_run(
        receivers: &[Receiver],
        pool: &[Quantifier],
        window_praise_count: i64,
        settings: &AssignmentSettings,
        rng: &mut dyn RngCore,
    ) -> EngineResult<DryRunOutcome> {
        let constructor = constructor_for(settings, pool.len());
        let resolver = AssignmentResolver::new(settings.conflict_retry_limit);
        let verifier = AssignmentVerifier::new(settings.redundancy_factor);

        let mut best: Option<AssignmentResult> = None;
        for attempt in 1..=settings.max_attempts {
            let bins = constructor.construct_bins(receivers, &mut *rng)?;
            let mut shuffled_pool = pool.to_vec();
            shuffled_pool.shuffle(&mut *rng);

            let result = resolver.resolve(bins, shuffled_pool);
            verifier.verify(&result, window_praise_count)?;

            debug!(
                attempt,
                strategy = constructor.name(),
                assigned_quantifiers = result.pool_assignments.len(),
                remaining_assignments = result.remaining_assignments_count,
                remaining_items = result.remaining_item_count,
                "试算完成"
            );

            if result.is_complete() {
                return Ok(DryRunOutcome {
                    result,
                    attempts: attempt,
                    settings: *settings,
                });
            }

            best = match best {
                Some(prev) if prev.remaining_item_count <= result.remaining_item_count => Some(prev),
                _ => Some(result),
            };
        }

        Ok(DryRunOutcome {
            result: best.unwrap_or_default(),
            attempts: settings.max_attempts,
            settings: *settings,
        })
    }

    // ==========================================
    // 输入加载
    // ==========================================

    /// 加载周期试算所需的全部输入
    pub async fn load_inputs(&self, period_id: &str) -> EngineResult<AssignmentInputs> {
        let period = self.repos.period_repo.get(period_id)?;
        let window = self.repos.period_repo.window_for(&period)?;
        let receivers = self.repos.praise_repo.list_receivers_with_praise(&window)?;
        let window_praise_count = self.repos.praise_repo.count_in_window(&window)?;
        let pool = self.repos.quantifier_repo.list_eligible()?;
        let settings = self.config.load_settings(period_id).await?;

        Ok(AssignmentInputs {
            period,
            window,
            receivers,
            pool,
            window_praise_count,
            settings,
        })
    }

    // ==========================================
    // 量化人池规模预检（只读）
    // ==========================================

    /// 预检量化人池是否足够
    ///
    /// 均分模式满足前置条件（池 >= K 且接收人 >= K）时直接返回无缺口
    ///
    /// 该判断不考虑冲突: 冲突密集时实际提交仍可能出现剩余并返回 Deficit
    #[instrument(skip(self), fields(period_id = %period_id))]
    pub async fn verify_pool_size(&self, period_id: &str) -> EngineResult<PoolSizeReport> {
        let inputs = self.load_inputs(period_id).await?;
        let pool_size = inputs.pool.len();
        let k = inputs.settings.redundancy_factor;

        if inputs.settings.mode == AssignmentMode::Even
            && pool_size >= k
            && inputs.receivers.len() >= k
        {
            debug!(pool_size, k, "均分模式跳过试算，未计入冲突");
            return Ok(PoolSizeReport {
                pool_size,
                pool_size_needed: pool_size,
                pool_deficit: 0,
            });
        }

        let mut rng = self.make_rng();
        let outcome = match Self::dry_run(
            &inputs.receivers,
            &inputs.pool,
            inputs.window_praise_count,
            &inputs.settings,
            &mut rng,
        ) {
            Ok(outcome) => outcome,
            Err(EngineError::InsufficientPool { pool_size, required }) => {
                return Ok(PoolSizeReport {
                    pool_size,
                    pool_size_needed: required,
                    pool_deficit: required - pool_size,
                });
            }
            Err(e) => return Err(e),
        };

        let result = &outcome.result;
        let report = PoolSizeReport {
            pool_size,
            pool_size_needed: result.pool_assignments.len() + result.remaining_assignments_count,
            pool_deficit: result.remaining_assignments_count,
        };
        info!(
            pool_size = report.pool_size,
            pool_size_needed = report.pool_size_needed,
            pool_deficit = report.pool_deficit,
            "量化人池预检完成"
        );
        Ok(report)
    }

    // ==========================================
    // 分配提交
    // ==========================================

    /// 执行分配并提交
    ///
    /// # 参数
    /// - period_id: 周期ID
    /// - actor: 操作人
    #[instrument(skip(self), fields(period_id = %period_id, actor = %actor))]
    pub async fn assign(&self, period_id: &str, actor: &str) -> EngineResult<AssignmentSummary> {
        let _guard = self.locks.acquire(period_id).await;

        let inputs = self.load_inputs(period_id).await?;
        self.check_assign_preconditions(&inputs)?;

        info!(
            receivers = inputs.receivers.len(),
            pool_size = inputs.pool.len(),
            praise_count = inputs.window_praise_count,
            mode = %inputs.settings.mode,
            redundancy = inputs.settings.redundancy_factor,
            "开始分配量化人"
        );

        let mut rng = self.make_rng();
        let outcome = Self::dry_run(
            &inputs.receivers,
            &inputs.pool,
            inputs.window_praise_count,
            &inputs.settings,
            &mut rng,
        )?;

        if !outcome.result.is_complete() {
            return Err(self.record_deficit(period_id, actor, &outcome));
        }

        let now = Utc::now().naive_utc();
        let records: Vec<Quantification> = outcome
            .result
            .pool_assignments
            .iter()
            .flat_map(|q| {
                q.assigned_receivers.iter().flat_map(move |r| {
                    r.praise_ids
                        .iter()
                        .map(move |praise_id| Quantification::neutral(praise_id, &q.quantifier_id, now))
                })
            })
            .collect();

        let written = self
            .repos
            .quantification_repo
            .commit_assignment(period_id, &inputs.window, &records)
            .map_err(from_commit_error)?;

        let summary = AssignmentSummary {
            period_id: period_id.to_string(),
            mode: inputs.settings.mode,
            attempts: outcome.attempts,
            quantifier_count: outcome.result.pool_assignments.len(),
            quantification_count: written,
        };

        let log = ActionLog::new(Some(period_id.to_string()), ActionType::AssignQuantifiers, actor)
            .with_payload(&json!({
                "summary": &summary,
                "settings": &inputs.settings,
            }))
            .with_detail(format!(
                "已分配 {} 位量化人，写入 {} 条量化记录",
                summary.quantifier_count, summary.quantification_count
            ));
        self.repos.action_log_repo.insert(&log)?;

        info!(
            attempts = summary.attempts,
            quantifiers = summary.quantifier_count,
            quantifications = summary.quantification_count,
            "分配已提交，周期进入 QUANTIFY"
        );
        Ok(summary)
    }

    fn check_assign_preconditions(&self, inputs: &AssignmentInputs) -> EngineResult<()> {
        let period = &inputs.period;
        if !period.is_open() {
            return Err(EngineError::InvalidPeriodState {
                period_id: period.period_id.clone(),
                expected: PeriodStatus::Open.to_string(),
                actual: period.status.to_string(),
            });
        }

        let existing = self.repos.quantification_repo.count_in_window(&inputs.window)?;
        if existing > 0 {
            return Err(EngineError::AlreadyAssigned {
                period_id: period.period_id.clone(),
                count: existing,
            });
        }
        Ok(())
    }

    /// 记录分配不足审计并构造错误
    fn record_deficit(&self, period_id: &str, actor: &str, outcome: &DryRunOutcome) -> EngineError {
        let result = &outcome.result;
        warn!(
            attempts = outcome.attempts,
            remaining_assignments = result.remaining_assignments_count,
            remaining_items = result.remaining_item_count,
            "试算次数耗尽，仍有未分配工作"
        );

        let log = ActionLog::new(Some(period_id.to_string()), ActionType::AssignmentDeficit, actor)
            .with_payload(&json!({
                "attempts": outcome.attempts,
                "remaining_assignments": result.remaining_assignments_count,
                "remaining_items": result.remaining_item_count,
                "settings": &outcome.settings,
            }))
            .with_detail(format!(
                "试算 {} 次后仍有 {} 个分配箱 ({} 条赞誉) 未分配",
                outcome.attempts, result.remaining_assignments_count, result.remaining_item_count
            ));
        if let Err(e) = self.repos.action_log_repo.insert(&log) {
            warn!(error = %e, "分配不足审计写入失败");
        }

        EngineError::Deficit {
            attempts: outcome.attempts,
            remaining_assignments: result.remaining_assignments_count,
            remaining_items: result.remaining_item_count,
        }
    }

    // ==========================================
    // 周期关闭
    // ==========================================

    /// QUANTIFY → CLOSED
    #[instrument(skip(self), fields(period_id = %period_id, actor = %actor))]
    pub async fn close_period(&self, period_id: &str, actor: &str) -> EngineResult<()> {
        let _guard = self.locks.acquire(period_id).await;

        let period = self.repos.period_repo.get(period_id)?;
        if !period.status.can_transition_to(PeriodStatus::Closed) {
            return Err(EngineError::InvalidStateTransition {
                period_id: period_id.to_string(),
                from: period.status.to_string(),
                to: PeriodStatus::Closed.to_string(),
            });
        }

        self.repos
            .period_repo
            .update_status(period_id, PeriodStatus::Quantify, PeriodStatus::Closed)
            .map_err(from_commit_error)?;

        let log = ActionLog::new(Some(period_id.to_string()), ActionType::ClosePeriod, actor)
            .with_detail(format!("周期 {} 已关闭", period.name));
        self.repos.action_log_repo.insert(&log)?;

        info!("周期已关闭");
        Ok(())
    }
}
