// ==========================================
// 赞誉量化分配系统 - 周期级互斥锁
// ==========================================
// 同一周期的分配提交、量化人替换、周期关闭串行执行
// 不同周期互不阻塞
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct PeriodLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PeriodLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取周期锁（持有期间同周期的其他写操作等待）
    pub async fn acquire(&self, period_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            // 中毒时沿用内部数据
            let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(period_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
