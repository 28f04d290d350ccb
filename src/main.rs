// ==========================================
// 赞誉量化分配系统 - 命令行入口
// ==========================================
// 用法:
//   praise-quant [db_path] preview <period_id>
//   praise-quant [db_path] assign  <period_id> [operator]
//   praise-quant [db_path] summary <period_id>
//   praise-quant [db_path] close   <period_id> [operator]
//   praise-quant [db_path] replace <period_id> <current_quantifier_id> <new_quantifier_id> [operator]
//   praise-quant [db_path] logs    <period_id>
// db_path 缺省时使用 PRAISE_QUANT_DB_PATH 或用户数据目录
// PRAISE_QUANT_LOG_FORMAT=json 输出 JSON 日志
// ==========================================

use anyhow::{anyhow, bail, Context};
use praise_quant::app::{get_default_db_path, AppState};
use praise_quant::logging;
use serde::Serialize;

const COMMANDS: [&str; 6] = ["preview", "assign", "summary", "close", "replace", "logs"];
const DEFAULT_OPERATOR: &str = "cli";

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn usage() -> anyhow::Error {
    anyhow!(
        "用法: praise-quant [db_path] <{}> <period_id> [...]",
        COMMANDS.join("|")
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match std::env::var("PRAISE_QUANT_LOG_FORMAT").as_deref() {
        Ok("json") => logging::init_json(),
        _ => logging::init(),
    }

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = match args.first() {
        Some(first) if !COMMANDS.contains(&first.as_str()) => args.remove(0),
        _ => get_default_db_path(),
    };

    let command = args.first().cloned().ok_or_else(usage)?;
    let period_id = args.get(1).cloned().ok_or_else(usage)?;
    let arg = |idx: usize| args.get(idx).map(String::as_str);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", praise_quant::APP_NAME, praise_quant::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let state = AppState::new(db_path)
        .map_err(|e| anyhow!(e))
        .context("无法初始化AppState")?;
    let api = &state.assignment_api;

    match command.as_str() {
        "preview" => print_json(&api.preview_pool_requirements(&period_id).await?)?,
        "assign" => {
            let operator = arg(2).unwrap_or(DEFAULT_OPERATOR);
            print_json(&api.commit_assignment(&period_id, operator).await?)?
        }
        "summary" => print_json(&api.period_details(&period_id)?)?,
        "close" => {
            let operator = arg(2).unwrap_or(DEFAULT_OPERATOR);
            api.close_period(&period_id, operator).await?;
            println!("周期 {} 已关闭", period_id);
        }
        "replace" => {
            let (current, new) = match (arg(2), arg(3)) {
                (Some(c), Some(n)) => (c, n),
                _ => bail!("replace 需要 <current_quantifier_id> <new_quantifier_id>"),
            };
            let operator = arg(4).unwrap_or(DEFAULT_OPERATOR);
            print_json(&api.replace_quantifier(&period_id, current, new, operator).await?)?
        }
        "logs" => print_json(&api.list_action_logs(&period_id)?)?,
        _ => return Err(usage()),
    }

    Ok(())
}
