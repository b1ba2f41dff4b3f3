use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use classify_problems::orchestrator::{App, RunMode};
use classify_problems::services::WorklistScope;
use classify_problems::utils::logging;
use classify_problems::Config;

#[derive(Parser)]
#[command(about = "竞赛编程题目的身份归一化与分类流水线")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// 每批处理的题目数量（覆盖 BATCH_SIZE）
    #[arg(long)]
    batch_size: Option<usize>,

    /// 条目间延迟秒数（覆盖 REQUEST_DELAY_SECS）
    #[arg(long)]
    delay: Option<f64>,
}

#[derive(Subcommand)]
enum Command {
    /// 入库：解析题目引用、抓取证据、分类并插入目录
    Ingest {
        /// 题目引用（URL 或简写，如 "CF 1794E"）
        references: Vec<String>,

        /// 从文件读取引用，每行一条，空行跳过
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// 分类：为存量目录行补全 type 字段
    Classify {
        /// 处理全部行，而不是仅 type 为空的行
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 初始化日志
    logging::init();

    let args = Args::parse();

    // 加载配置（命令行参数优先于环境变量）
    let mut config = Config::from_env();
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(delay) = args.delay {
        config.request_delay_secs = delay;
    }

    let mode = match args.command {
        Command::Ingest {
            mut references,
            file,
        } => {
            if let Some(path) = file {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("读取引用文件失败: {}", path.display()))?;
                references.extend(
                    content
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(String::from),
                );
            }
            RunMode::Ingest { references }
        }
        Command::Classify { all } => RunMode::Classify {
            scope: if all {
                WorklistScope::All
            } else {
                WorklistScope::UnclassifiedOnly
            },
        },
    };

    // 初始化并运行应用
    App::initialize(config).await?.run(mode).await?;

    Ok(())
}
