// ==========================================
// Agenda 导入 - 命令行入口
// ==========================================
// 子命令: template / detect / import / geocode
// 数据库: --db 或 AGENDA_DB_PATH, 否则用户数据目录
// ==========================================

use agenda_import::config::ConfigManager;
use agenda_import::db::open_and_migrate;
use agenda_import::domain::ImportMapping;
use agenda_import::importer::{generate_template, ImportPipeline, ProgressReporter};
use agenda_import::integrations::{ApiIntegrationManager, IntegrationConfig};
use agenda_import::repository::SqliteEntityRepository;
use agenda_import::{get_default_db_path, logging, EntityType, ImportProgress};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "agenda-import", version, about = "Import de clients, services et rendez-vous")]
struct Cli {
    /// 日志输出为 JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 生成 Excel 导入模板
    Template {
        entity: EntityType,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 识别文件列映射（不导入）
    Detect {
        file: PathBuf,
        entity: EntityType,
        #[arg(long)]
        db: Option<String>,
    },

    /// 导入文件
    Import {
        file: PathBuf,
        entity: EntityType,
        #[arg(long)]
        db: Option<String>,
        /// 手动映射, 形如 last_name=Nom（可重复）
        #[arg(short, long = "map", value_parser = parse_mapping_pair)]
        mappings: Vec<(String, String)>,
    },

    /// 地址地理编码（需要 GOOGLE_MAPS_API_KEY）
    Geocode { address: String },
}

fn parse_mapping_pair(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(key, header)| (key.trim().to_string(), header.trim().to_string()))
        .filter(|(key, header)| !key.is_empty() && !header.is_empty())
        .ok_or_else(|| format!("映射格式应为 key=En-tête: {}", value))
}

/// 打开数据库并构建导入流程（配置从 config_kv 读取）
async fn build_pipeline(db: Option<String>) -> anyhow::Result<ImportPipeline> {
    let db_path = db.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let conn = Arc::new(Mutex::new(
        open_and_migrate(&db_path).with_context(|| format!("无法打开数据库 {}", db_path))?,
    ));
    let config = ConfigManager::from_connection(conn.clone())?;
    let repo = Arc::new(SqliteEntityRepository::from_connection(conn)?);

    Ok(ImportPipeline::from_config(repo, &config).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }
    tracing::debug!("{} v{}", agenda_import::APP_NAME, agenda_import::VERSION);

    match cli.command {
        Command::Template { entity, output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(format!("{}.xlsx", entity.template_name())));
            generate_template(entity, &path)?;
            println!("{}", path.display());
        }

        Command::Detect { file, entity, db } => {
            let pipeline = build_pipeline(db).await?;
            let (grid, mapping) = pipeline.preview(&file, entity)?;
            let missing = mapping.missing_required(agenda_import::importer::columns_for(entity));
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "rows": grid.len().saturating_sub(1),
                    "mapping": mapping,
                    "missing_required": missing,
                }))?
            );
        }

        Command::Import {
            file,
            entity,
            db,
            mappings,
        } => {
            let pipeline = build_pipeline(db).await?;
            let mapping_override = (!mappings.is_empty()).then(|| ImportMapping::from_pairs(mappings));

            let (tx, mut rx) = mpsc::unbounded_channel::<ImportProgress>();
            let printer = tokio::spawn(async move {
                while let Some(progress) = rx.recv().await {
                    tracing::info!(phase = ?progress.phase, percentage = progress.percentage, "{}", progress.message);
                }
            });

            let progress = ProgressReporter::new(Some(tx));
            let report = pipeline
                .import_file(&file, entity, mapping_override, &progress)
                .await;
            drop(progress);
            printer.await?;

            let report = report?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.result.success {
                return Err(anyhow!("{} erreur(s) d'import", report.result.errors.len()));
            }
        }

        Command::Geocode { address } => {
            let manager = ApiIntegrationManager::with_reqwest(IntegrationConfig::from_env())?;
            let result = manager.geocode_address(&address).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
