// Dev utility: reset a database and seed one OPEN period with quantifiers and praise.
//
// Usage:
//   cargo run --bin seed_demo_period -- [db_path] [receiver_count]

use chrono::{Duration, Local, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use praise_quant::app::get_default_db_path;
use praise_quant::db::{init_schema, open_sqlite_connection};
use praise_quant::domain::{Period, PeriodStatus, Praise};
use praise_quant::engine::AssignmentRepositories;

const DEMO_PERIOD_ID: &str = "demo-period";
const DEFAULT_RECEIVER_COUNT: usize = 40;
const QUANTIFIER_COUNT: usize = 12;
const SEED: u64 = 20240601;

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    let receiver_count = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_RECEIVER_COUNT)
        .max(1);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let repos = AssignmentRepositories::from_connection(Arc::new(Mutex::new(conn)));

    let end_date = Utc::now().date_naive();
    repos.period_repo.create(&Period {
        period_id: DEMO_PERIOD_ID.to_string(),
        name: format!("Demo {}", end_date),
        status: PeriodStatus::Open,
        end_date,
        created_at: Utc::now().naive_utc(),
    })?;

    // 每位量化人关联一个账号，前几位同时也是接收人，用于制造利益冲突
    for i in 0..QUANTIFIER_COUNT {
        let user_id = format!("user-{:02}", i);
        repos
            .quantifier_repo
            .upsert(&user_id, Some(&format!("Quantifier {}", i)), true)?;
        repos
            .quantifier_repo
            .link_account(&format!("acc-{:03}", i), &user_id, Some("DISCORD"))?;
    }

    let mut rng = StdRng::seed_from_u64(SEED);
    let praises = build_praise(&mut rng, receiver_count, end_date);
    let inserted = repos.praise_repo.batch_insert(&praises)?;

    println!("db_path={}", db_path);
    println!("period_id={}", DEMO_PERIOD_ID);
    println!("quantifiers={}", QUANTIFIER_COUNT);
    println!("receivers={}", receiver_count);
    println!("praise={}", inserted);
    Ok(())
}

fn build_praise(rng: &mut StdRng, receiver_count: usize, end_date: NaiveDate) -> Vec<Praise> {
    let mut praises = Vec::new();
    for r in 0..receiver_count {
        let count = rng.gen_range(1..=8);
        for n in 0..count {
            let giver = rng.gen_range(0..receiver_count);
            praises.push(Praise {
                praise_id: uuid::Uuid::new_v4().to_string(),
                receiver_id: format!("acc-{:03}", r),
                giver_id: format!("acc-{:03}", giver),
                reason: format!("for helping out #{}", n + 1),
                praise_date: end_date - Duration::days(rng.gen_range(0..14)),
                score: 0.0,
            });
        }
    }
    praises
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup = format!("{}.bak_{}", db_path, ts);
    fs::copy(path, &backup)?;
    fs::remove_file(path)?;
    println!("backup={}", backup);
    Ok(())
}
