use clap::Parser;
use lecture_replace::config::{CliArgs, ClientConfig, Command, LogFormat, SlotArgs};
use lecture_replace::core::workflow::{Failure, ResponseOutcome};
use lecture_replace::core::{Notification, ReplacementSession};
use lecture_replace::domain::ports::ConfigProvider;
use lecture_replace::utils::error::{ErrorSeverity, ReplaceError, Result};
use lecture_replace::utils::{logger, validation::Validate};
use lecture_replace::HttpConflictClient;
use std::sync::Arc;

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,      // 沒有結果，但不是錯誤
        ErrorSeverity::Medium => 2,   // 可重試
        ErrorSeverity::High => 1,     // 輸入或選擇有誤
        ErrorSeverity::Critical => 3, // 設定或系統錯誤
    }
}

fn load_config(args: &CliArgs) -> Result<ClientConfig> {
    let config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    Ok(config.with_base_url(args.base_url.clone()))
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(e.severity()));
        }
    };

    // 初始化日誌
    match config.log_format() {
        LogFormat::Compact => logger::init_cli_logger(args.verbose, config.log_level()),
        LogFormat::Json => logger::init_json_logger(args.verbose, config.log_level()),
    }
    tracing::debug!("Configuration: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(exit_code(e.severity()));
    }

    match run(args.command, &config).await {
        Ok(None) => {}
        Ok(Some(failure)) => {
            eprintln!("❌ {}", failure.message);
            eprintln!("💡 {}", failure.suggestion);
            let code = exit_code(failure.category.severity());
            if code > 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            let code = exit_code(e.severity());
            if code > 0 {
                std::process::exit(code);
            }
        }
    }
}

/// 失敗的嘗試以 `Some(Failure)` 回傳，其他錯誤走 `Err`
async fn run(command: Command, config: &ClientConfig) -> Result<Option<Failure>> {
    let client = Arc::new(HttpConflictClient::new(config)?);
    let session = ReplacementSession::new(client, config.slots_per_day());
    let today = chrono::Local::now().date_naive();

    match command {
        Command::Timetable(class_args) => {
            let class = class_args.class_ref(config.default_branch())?;
            let grid = session.fetch_schedule(&class).await?;
            println!("{}", grid);
            Ok(None)
        }
        Command::Candidates(slot) => {
            select(&session, &slot, config, today).await?;
            if let Some(failure) = settle(session.fetch_candidates().await?) {
                return Ok(Some(failure));
            }
            let workflow = session.snapshot().await;
            println!("{:<12} {:<28} {}", "ID", "NAME", "DEPARTMENT");
            for candidate in workflow.candidates() {
                println!(
                    "{:<12} {:<28} {}",
                    candidate.faculty_id, candidate.name, candidate.department
                );
            }
            Ok(None)
        }
        Command::Options(slot) => {
            select(&session, &slot, config, today).await?;
            if let Some(failure) = settle(session.fetch_options().await?) {
                return Ok(Some(failure));
            }
            let workflow = session.snapshot().await;
            for option in workflow.options() {
                println!("[{}] {}", option.option_id(), option.description());
                println!(
                    "    {} ({}): {} -> {}",
                    option.primary().name,
                    option.primary().faculty_id,
                    option.primary().current_class,
                    option.primary().new_class
                );
                println!(
                    "    {} ({}): takes over {}",
                    option.secondary().name,
                    option.secondary().faculty_id,
                    option.secondary().takes_over
                );
            }
            Ok(None)
        }
        Command::Assign { slot, faculty } => {
            select(&session, &slot, config, today).await?;
            if let Some(failure) = settle(session.fetch_candidates().await?) {
                return Ok(Some(failure));
            }
            session.select_candidate(&faculty).await?;
            finish(&session).await
        }
        Command::Rearrange { slot, option } => {
            select(&session, &slot, config, today).await?;
            if let Some(failure) = settle(session.fetch_options().await?) {
                return Ok(Some(failure));
            }
            session.select_option(&option).await?;
            finish(&session).await
        }
    }
}

async fn select(
    session: &ReplacementSession,
    slot: &SlotArgs,
    config: &ClientConfig,
    today: chrono::NaiveDate,
) -> Result<()> {
    let selection = slot.to_selection(config.default_branch(), today)?;
    session.select_slot(selection).await;
    Ok(())
}

fn settle(outcome: ResponseOutcome) -> Option<Failure> {
    match outcome {
        ResponseOutcome::Applied | ResponseOutcome::Discarded => None,
        ResponseOutcome::Failed(failure) => Some(failure),
    }
}

/// 執行並依序印出每一則通知
async fn finish(session: &ReplacementSession) -> Result<Option<Failure>> {
    if let Some(failure) = settle(session.execute().await?) {
        return Ok(Some(failure));
    }

    let notifications: Vec<Notification> = session
        .with_workflow(|workflow| {
            let queue = workflow.notifications_mut();
            let mut shown = Vec::with_capacity(queue.len());
            while let Some(notification) = queue.current().cloned() {
                shown.push(notification);
                queue.advance();
            }
            shown
        })
        .await;

    if notifications.is_empty() {
        return Err(ReplaceError::protocol("Execution finished without a result"));
    }

    let total = notifications.len();
    for (i, notification) in notifications.iter().enumerate() {
        println!("✅ [{}/{}] {}", i + 1, total, notification.headline);
        println!("{}", notification.message);
        println!();
    }
    Ok(None)
}
