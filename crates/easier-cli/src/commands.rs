use std::io::Write as _;
use std::path::{Path, PathBuf};

use easier_client::client::ServiceClient;
use easier_client::flows::{authenticate, register};
use easier_client::session::Session;
use easier_client::store::SessionStore;
use easier_core::aggregate::SortState;
use easier_core::dashboard::{UsageDashboard, UsageTable};
use easier_core::models::chat_history::ChatRole;
use easier_core::models::document::RetrieveRequest;
use easier_core::models::role::Role;
use easier_core::models::synthetic_user::UsersOutcome;
use easier_core::progress::{
    ANSWER_STAGES, DOCUMENT_STAGES, IMAGE_STAGES, StageLabels, TOPIC_STAGES,
};
use easier_services::documents::{
    DocumentChat, generate_answer, retrieve_passages, upload_document,
};
use easier_services::images::describe_image;
use easier_services::topics::summarize_topic;
use easier_services::usage::fetch_usage;
use easier_services::users::fetch_users;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::{Args, Command, ConfigCommand};
use crate::config::{self, API_URL_ENV, EasierConfig};
use crate::render::{self, ProgressDisplay, UsageSorts};

/// Settings and stores shared by every subcommand.
pub struct Context {
    pub config: EasierConfig,
    pub config_path: PathBuf,
    pub api_url: String,
    pub store: SessionStore,
}

impl Context {
    pub fn from_args(args: &Args) -> eyre::Result<Self> {
        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => config::default_config_path()?,
        };
        let config = config::load_config(&config_path)?;
        let env_url = std::env::var(API_URL_ENV).ok();
        let api_url = config::resolve_api_url(args.api_url.as_deref(), env_url.as_deref(), &config);

        debug!(api_url = %api_url, config = %config_path.display(), "resolved settings");

        Ok(Self {
            config,
            config_path,
            api_url,
            store: SessionStore::default_location()?,
        })
    }

    pub fn client(&self) -> eyre::Result<ServiceClient> {
        Ok(ServiceClient::new(&self.api_url, self.config.timeout())?)
    }

    /// The stored session, provided it is signed in and not expired.
    pub fn active_session(&self) -> eyre::Result<Session> {
        let session = self.store.load()?;
        session.ensure_active(jiff::Timestamp::now())?;
        Ok(session)
    }
}

pub async fn run(args: Args) -> eyre::Result<()> {
    let ctx = Context::from_args(&args)?;

    match args.command {
        Command::Login { username, password } => login(&ctx, &username, password).await,
        Command::Register {
            username,
            password,
            role,
        } => register_account(&ctx, &username, password, Role::from(role.as_str())).await,
        Command::Logout => logout(&ctx),
        Command::Whoami => {
            let session = ctx.store.load()?;
            print!("{}", render::whoami(&session, jiff::Timestamp::now()));
            Ok(())
        }
        Command::Upload { file } => upload(&ctx, &file).await,
        Command::Ask { question } => ask(&ctx, &question).await,
        Command::Retrieve {
            query,
            top_k,
            threshold,
        } => retrieve(&ctx, query, top_k, threshold).await,
        Command::Chat { file } => chat(&ctx, &file).await,
        Command::Describe { image, json } => describe(&ctx, &image, json).await,
        Command::Summarize { topic, json } => summarize(&ctx, &topic, json).await,
        Command::Users { json } => users(&ctx, json).await,
        Command::Usage {
            sort_detailed,
            sort_feature,
            sort_user,
            json,
        } => {
            let sorts = [
                (UsageTable::Detailed, sort_detailed),
                (UsageTable::ByFeature, sort_feature),
                (UsageTable::ByUser, sort_user),
            ];
            usage(&ctx, sorts, json).await
        }
        Command::Config { action } => config_command(&ctx, action),
    }
}

// ── Session ─────────────────────────────────────────────────────────────────

fn password_or_prompt(password: Option<String>, confirm: bool) -> eyre::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let mut prompt = dialoguer::Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

async fn login(ctx: &Context, username: &str, password: Option<String>) -> eyre::Result<()> {
    let password = password_or_prompt(password, false)?;
    let session = authenticate(&ctx.client()?, username, &password).await?;
    ctx.store.save(&session)?;

    let role = session.role().map(Role::as_str).unwrap_or("user");
    println!("Signed in as {username} ({role}).");
    Ok(())
}

async fn register_account(
    ctx: &Context,
    username: &str,
    password: Option<String>,
    role: Role,
) -> eyre::Result<()> {
    let password = password_or_prompt(password, true)?;
    let message = register(&ctx.client()?, username, &password, &role).await?;
    println!(
        "{}",
        message.unwrap_or_else(|| format!("Registered {username}."))
    );
    println!("Run `easier login {username}` to sign in.");
    Ok(())
}

fn logout(ctx: &Context) -> eyre::Result<()> {
    let mut session = ctx.store.load()?;
    let was_signed_in = session.is_authenticated();
    session.logout();
    ctx.store.save(&session)?;

    if was_signed_in {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

// ── Documents ───────────────────────────────────────────────────────────────

async fn upload(ctx: &Context, file: &Path) -> eyre::Result<()> {
    let session = ctx.active_session()?;
    let client = ctx.client()?;

    let progress = ProgressDisplay::start(DOCUMENT_STAGES);
    let receipt = upload_document(&client, &session, file, progress.tracker()).await;
    progress.finish().await;

    let receipt = receipt?;
    println!("{}", receipt.summary().unwrap_or("Upload complete."));
    Ok(())
}

async fn ask(ctx: &Context, question: &str) -> eyre::Result<()> {
    let session = ctx.active_session()?;
    let client = ctx.client()?;

    let progress = ProgressDisplay::start(ANSWER_STAGES);
    let answer = generate_answer(&client, &session, question, progress.tracker()).await;
    progress.finish().await;

    println!("{}", answer?);
    Ok(())
}

async fn retrieve(
    ctx: &Context,
    query: String,
    top_k: Option<u32>,
    threshold: Option<f32>,
) -> eyre::Result<()> {
    let session = ctx.active_session()?;
    let client = ctx.client()?;
    let request = RetrieveRequest {
        query,
        top_k: top_k.unwrap_or(ctx.config.top_k),
        similarity_threshold: threshold.unwrap_or(ctx.config.similarity_threshold),
    };

    let progress = ProgressDisplay::start(ANSWER_STAGES);
    let passages = retrieve_passages(&client, &session, &request, progress.tracker()).await;
    progress.finish().await;

    print!("{}", render::passages(&passages?));
    Ok(())
}

async fn chat(ctx: &Context, file: &Path) -> eyre::Result<()> {
    let session = ctx.active_session()?;
    let chat = DocumentChat::new(ctx.client()?);

    chat_upload(&chat, &session, file).await?;
    println!("Ask questions about the document. Commands: /upload <file>, /history, /reset, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => print_history(&chat),
            "/reset" => {
                chat.reset();
                println!("Conversation cleared. Use /upload <file> to start again.");
            }
            command if command.starts_with("/upload") => {
                let path = command.trim_start_matches("/upload").trim();
                if path.is_empty() {
                    eprintln!("usage: /upload <file>");
                } else if let Err(e) = chat_upload(&chat, &session, Path::new(path)).await {
                    eprintln!("error: {e}");
                }
            }
            question => {
                let progress = ProgressDisplay::start(ANSWER_STAGES);
                let answer = chat.ask(&session, question, progress.tracker()).await;
                progress.finish().await;

                match answer {
                    Ok(answer) => println!("{answer}\n"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
        }
    }
    Ok(())
}

async fn chat_upload(chat: &DocumentChat, session: &Session, file: &Path) -> eyre::Result<()> {
    let progress = ProgressDisplay::start(DOCUMENT_STAGES);
    let receipt = chat.upload(session, file, progress.tracker()).await;
    progress.finish().await;

    let receipt = receipt?;
    let name = chat.file_name().unwrap_or_else(|| file.display().to_string());
    match receipt.summary() {
        Some(summary) => println!("{name}: {summary}"),
        None => println!("{name} uploaded."),
    }
    Ok(())
}

fn print_history(chat: &DocumentChat) {
    let history = chat.history();
    if history.is_empty() {
        println!("No questions yet.");
        return;
    }
    for message in history {
        let speaker = match message.role {
            ChatRole::User => "you",
            ChatRole::Assistant => "answer",
        };
        println!("{speaker}: {}", message.content);
    }
}

// ── Other features ──────────────────────────────────────────────────────────

async fn describe(ctx: &Context, image: &Path, json: bool) -> eyre::Result<()> {
    let session = ctx.active_session()?;
    let client = ctx.client()?;

    let progress = progress_unless_json(IMAGE_STAGES, json);
    let tracker = progress.as_ref().and_then(ProgressDisplay::tracker);
    let description = describe_image(&client, &session, image, tracker).await;
    finish(progress).await;

    let description = description?;
    if json {
        println!("{}", serde_json::to_string_pretty(&description)?);
    } else {
        print!("{}", render::image_description(&description));
    }
    Ok(())
}

async fn summarize(ctx: &Context, topic: &str, json: bool) -> eyre::Result<()> {
    let session = ctx.active_session()?;
    let client = ctx.client()?;

    let progress = progress_unless_json(TOPIC_STAGES, json);
    let tracker = progress.as_ref().and_then(ProgressDisplay::tracker);
    let summary = summarize_topic(&client, &session, topic, tracker).await;
    finish(progress).await;

    let summary = summary?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render::topic_summary(&summary));
    }
    Ok(())
}

async fn users(ctx: &Context, json: bool) -> eyre::Result<()> {
    let session = ctx.active_session()?;
    let outcome = fetch_users(&ctx.client()?, &session, None).await?;

    match (outcome, json) {
        (UsersOutcome::Users(rows), true) => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        (UsersOutcome::Users(rows), false) => print!("{}", render::synthetic_users(&rows)),
        (UsersOutcome::Failed { error, raw_response }, true) => {
            let body = serde_json::json!({ "error": error, "raw_response": raw_response });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        (UsersOutcome::Failed { error, raw_response }, false) => {
            print!("{}", render::users_failure(&error, raw_response.as_deref()));
        }
    }
    Ok(())
}

async fn usage(
    ctx: &Context,
    sorts: [(UsageTable, Option<SortState>); 3],
    json: bool,
) -> eyre::Result<()> {
    let session = ctx.active_session()?;
    let records = fetch_usage(&ctx.client()?, &session, None).await?;

    let mut dashboard = UsageDashboard::new(records);
    for (table, sort) in sorts {
        if let Some(sort) = sort {
            dashboard.set_sort(table, sort);
        }
    }

    let report = dashboard.report();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let sorts = UsageSorts {
            detailed: dashboard.sort_state(UsageTable::Detailed),
            by_feature: dashboard.sort_state(UsageTable::ByFeature),
            by_user: dashboard.sort_state(UsageTable::ByUser),
        };
        print!("{}", render::usage_report(&report, sorts));
    }
    Ok(())
}

fn progress_unless_json(labels: StageLabels, json: bool) -> Option<ProgressDisplay> {
    (!json).then(|| ProgressDisplay::start(labels))
}

async fn finish(progress: Option<ProgressDisplay>) {
    if let Some(progress) = progress {
        progress.finish().await;
    }
}

// ── Config ──────────────────────────────────────────────────────────────────

fn config_command(ctx: &Context, action: ConfigCommand) -> eyre::Result<()> {
    match action {
        ConfigCommand::Show => print!("{}", render::config(&ctx.config, &ctx.api_url)),
        ConfigCommand::Set { key, value } => {
            let mut config = ctx.config.clone();
            config.set(key, &value)?;
            config::save_config(&ctx.config_path, &config)?;
            println!("Saved {}.", ctx.config_path.display());
        }
        ConfigCommand::Path => println!("{}", ctx.config_path.display()),
    }
    Ok(())
}
