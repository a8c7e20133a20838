// ==========================================
// 教务数据同步系统 - 命令行入口
// ==========================================
// 子命令:
// - sync: 从教务系统（离线快照）全量同步到本地库
// - profile: 以学生本人身份刷新个人档案
// - roster: 查看本地库中的教学班名册
// - config-set: 写入 config_kv 全局配置
// ==========================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};

use hfut_sync::config::{ConfigManager, SyncConfigReader};
use hfut_sync::db::{default_db_path, open_shared_connection};
use hfut_sync::domain::types::{Campus, SyncRunStatus};
use hfut_sync::domain::TeachingClassKey;
use hfut_sync::engine::{ProfileRefresher, SyncOptions, SyncOrchestrator, SyncRepositories};
use hfut_sync::portal::{Credentials, SnapshotPortalClient};
use hfut_sync::{logging, APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "hfut-sync", version, about = "教务数据同步系统")]
struct Cli {
    /// SQLite 数据库路径（默认位于用户数据目录）
    #[arg(long, global = true, env = "HFUT_SYNC_DB_PATH")]
    db: Option<PathBuf>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 全量同步学期/专业/课程/教学班/名册
    Sync(SyncArgs),
    /// 刷新学生本人档案
    Profile(ProfileArgs),
    /// 查看教学班名册
    Roster(RosterArgs),
    /// 写入全局配置项（如 sync.account_code）
    ConfigSet(ConfigSetArgs),
}

#[derive(Args)]
struct SyncArgs {
    /// 教务系统 JSON 快照
    #[arg(long)]
    snapshot: PathBuf,

    /// 同步账号（覆盖 sync.account_code）
    #[arg(long)]
    code: Option<String>,

    /// 同步密码（覆盖 sync.account_password）
    #[arg(long)]
    password: Option<String>,

    /// 校区 HF / XC（覆盖 sync.campus）
    #[arg(long)]
    campus: Option<String>,

    /// 分支失败时继续同步其余分支
    #[arg(long)]
    keep_going: bool,

    /// 多次运行之间复用实体缓存
    #[arg(long)]
    reuse_cache: bool,

    /// 连续运行次数
    #[arg(long, default_value_t = 1)]
    repeat: u32,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    snapshot: PathBuf,

    #[arg(long)]
    code: String,

    #[arg(long)]
    password: String,

    #[arg(long, default_value = "HF")]
    campus: String,
}

#[derive(Args)]
struct RosterArgs {
    #[arg(long)]
    term: String,

    #[arg(long)]
    course: String,

    #[arg(long)]
    number: String,
}

#[derive(Args)]
struct ConfigSetArgs {
    key: String,
    value: String,
}

fn parse_campus(raw: &str) -> Result<Campus> {
    Campus::parse(raw).ok_or_else(|| anyhow!("无法识别的校区: {}（可选 HF / XC）", raw))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    let db_path = cli.db.unwrap_or_else(default_db_path);
    let db_path = db_path.to_string_lossy().to_string();
    tracing::info!(version = VERSION, db = %db_path, "{} 启动", APP_NAME);

    match cli.cmd {
        Command::Sync(args) => run_sync(&db_path, args).await,
        Command::Profile(args) => run_profile(&db_path, args).await,
        Command::Roster(args) => run_roster(&db_path, args),
        Command::ConfigSet(args) => {
            let config = ConfigManager::new(&db_path).map_err(|e| anyhow!(e))?;
            config
                .set_global_config_value(&args.key, &args.value)
                .map_err(|e| anyhow!(e))?;
            println!("{} 已更新", args.key);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_sync(db_path: &str, args: SyncArgs) -> Result<ExitCode> {
    let conn = open_shared_connection(db_path).with_context(|| format!("打开数据库失败: {}", db_path))?;
    let repos = SyncRepositories::from_connection(conn.clone())?;
    let config = ConfigManager::from_connection(conn).map_err(|e| anyhow!(e))?;
    let settings = config.get_sync_settings().await.map_err(|e| anyhow!(e))?;

    let code = args
        .code
        .or(settings.account_code)
        .context("未提供同步账号（--code 或 sync.account_code）")?;
    let password = args
        .password
        .or(settings.account_password)
        .context("未提供同步密码（--password 或 sync.account_password）")?;
    let campus = match args.campus.as_deref() {
        Some(raw) => parse_campus(raw)?,
        None => settings.campus,
    };
    let options = SyncOptions {
        fail_fast: settings.fail_fast && !args.keep_going,
        reuse_entity_cache: settings.reuse_entity_cache || args.reuse_cache,
    };

    let client = Arc::new(
        SnapshotPortalClient::from_file(&args.snapshot)
            .with_context(|| format!("加载快照失败: {}", args.snapshot.display()))?,
    );
    let mut orchestrator = SyncOrchestrator::new(
        client,
        repos,
        Credentials::new(code, password, campus),
        options,
    );

    let mut exit = ExitCode::SUCCESS;
    for _ in 0..args.repeat.max(1) {
        let report = orchestrator.run_full_sync().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if report.status == SyncRunStatus::Partial {
            exit = ExitCode::from(1);
        }
    }
    Ok(exit)
}

async fn run_profile(db_path: &str, args: ProfileArgs) -> Result<ExitCode> {
    let repos = SyncRepositories::open(db_path)?;
    let client = Arc::new(SnapshotPortalClient::from_file(&args.snapshot)?);
    let refresher = ProfileRefresher::new(client, Arc::new(repos));

    let credentials = Credentials::new(args.code, args.password, parse_campus(&args.campus)?);
    let student = refresher.refresh(&credentials).await?;
    println!("{}", serde_json::to_string_pretty(&student)?);
    Ok(ExitCode::SUCCESS)
}

fn run_roster(db_path: &str, args: RosterArgs) -> Result<ExitCode> {
    let repos = SyncRepositories::open(db_path)?;
    let key = TeachingClassKey::new(&args.term, &args.course, &args.number);

    let class = repos
        .teaching_class_repo
        .find_by_key(&key)?
        .with_context(|| format!("教学班不存在: {}", key))?;
    println!("{}", class);

    for code in repos.teaching_class_repo.list_roster(&key)? {
        match repos.student_repo.find_by_code(&code)? {
            Some(student) => println!(
                "{}\t{}\t{}",
                student.code,
                student.name,
                student.sex.map(|s| s.to_db_str()).unwrap_or("-")
            ),
            None => println!("{}\t(缺失)", code),
        }
    }
    Ok(ExitCode::SUCCESS)
}
