//! 프리랜서 마켓플레이스 운영 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 마이그레이션 적용
//! freelance migrate
//!
//! # 샘플 계정과 관리자 생성
//! freelance seed --admin-email admin@example.com --admin-password changeme
//!
//! # 비밀번호 해시 생성
//! freelance hash-password password123
//!
//! # 개발용 토큰 발급
//! freelance issue-token --id <ACCOUNT_ID> --role client
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use freelance_core::{init_logging_from_env, AppConfig, PgStore};
use secrecy::SecretString;
use tracing::{error, info, warn};

mod commands;

use commands::seed::{seed_accounts, AdminSeed};

#[derive(Parser)]
#[command(name = "freelance")]
#[command(about = "Freelance marketplace CLI - 데이터베이스 및 인증 관리 도구", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 데이터베이스 마이그레이션 실행
    Migrate {
        /// 데이터베이스 URL (기본: 설정 파일 또는 FREELANCE__DATABASE__URL)
        #[arg(long)]
        db_url: Option<String>,
    },

    /// 샘플 계정 생성 (이미 있는 이메일은 건너뜀)
    Seed {
        /// 데이터베이스 URL (기본: 설정 파일 또는 FREELANCE__DATABASE__URL)
        #[arg(long)]
        db_url: Option<String>,

        /// 함께 만들 관리자 이메일
        #[arg(long, requires = "admin_password")]
        admin_email: Option<String>,

        /// 관리자 비밀번호
        #[arg(long, requires = "admin_email")]
        admin_password: Option<String>,
    },

    /// 비밀번호의 Argon2 해시 출력
    HashPassword {
        /// 평문 비밀번호
        password: String,
    },

    /// 설정된 시크릿으로 액세스 토큰 발급
    IssueToken {
        /// 계정 ID
        #[arg(long)]
        id: String,

        /// 역할 (freelancer, client, admin)
        #[arg(short, long)]
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    init_logging_from_env().map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let cli = Cli::parse();
    let mut config = AppConfig::load_default().context("failed to load configuration")?;

    match cli.command {
        Commands::Migrate { db_url } => {
            if let Some(url) = db_url {
                config.database.url = Some(SecretString::from(url));
            }

            if let Err(e) = commands::migrate::run(&config.database).await {
                error!("Migration failed: {:#}", e);
                return Err(e);
            }
            println!("\n✅ 마이그레이션 완료");
        }

        Commands::Seed {
            db_url,
            admin_email,
            admin_password,
        } => {
            if let Some(url) = db_url {
                config.database.url = Some(SecretString::from(url));
            }

            let admin = match (admin_email, admin_password) {
                (Some(email), Some(password)) => Some(AdminSeed { email, password }),
                _ => None,
            };

            let store = PgStore::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?;

            let report = seed_accounts(&store, admin).await?;
            info!(created = report.created, skipped = report.skipped, "Seeding finished");
            println!("\n✅ 시드 완료: 생성 {}, 건너뜀 {}", report.created, report.skipped);
        }

        Commands::HashPassword { password } => {
            let hash = commands::hash_password::run(&password)?;
            println!("{hash}");
        }

        Commands::IssueToken { id, role } => {
            if config.auth.jwt_secret.is_none() {
                warn!("auth.jwt_secret not set, token is signed with the development secret");
            }

            let token = commands::issue_token::run(&config.auth, &id, &role)?;
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
    }

    Ok(())
}
