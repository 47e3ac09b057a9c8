use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, normalize_api_url},
    AuthContext, DetailController, ErrorReporter, FailureReport, GatewayClient, HighlightTerm,
    ListingController, LoginResult, Navigator, Route, SearchForm, SubmissionMachine,
    SubmissionState, UploadFile, UploadForm,
};
use shared::domain::ReceiptId;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;
mod session_file;

use session_file::FileSessionStore;

#[derive(Parser, Debug)]
#[command(name = "receipts", about = "Upload and browse processed receipts")]
struct Args {
    /// Overrides the configured backend base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Overrides the configured session file.
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange an identity-provider credential for a session.
    Login {
        #[arg(long)]
        credential: String,
    },
    Logout,
    Whoami,
    /// Upload a receipt image or PDF for processing.
    Upload { path: PathBuf },
    /// List receipts, optionally filtered.
    List {
        #[arg(long, default_value = "")]
        supermarket: String,
        #[arg(long, default_value = "")]
        item: String,
        /// YYYY-MM-DD, inclusive.
        #[arg(long, default_value = "")]
        min_date: String,
        /// YYYY-MM-DD, inclusive.
        #[arg(long, default_value = "")]
        max_date: String,
    },
    /// Show one receipt with its items.
    Show {
        id: i64,
        /// Marks items whose name contains this text.
        #[arg(long)]
        highlight: Option<String>,
    },
}

impl Command {
    fn route(&self) -> Route {
        match self {
            Command::Login { .. } => Route::Login,
            Command::Logout => Route::Logout,
            Command::Whoami => Route::Home,
            Command::Upload { .. } => Route::ReceiptUpload,
            Command::List { .. } | Command::Show { .. } => Route::ReceiptList,
        }
    }
}

struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        debug!(?route, "navigate");
        if route == Route::Login {
            eprintln!("signed out; run `receipts login --credential <token>` to sign in");
        }
    }
}

struct TerminalReporter;

impl ErrorReporter for TerminalReporter {
    fn report(&self, report: &FailureReport) {
        eprintln!("{}", render::failure(report));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(api_url) = args.api_url.as_deref() {
        settings.api_url = normalize_api_url(api_url)?;
    }
    if let Some(session_file) = args.session_file.clone() {
        settings.session_file = session_file;
    }
    debug!(api_url = %settings.api_url, session_file = %settings.session_file.display(), "settings loaded");

    let store = Arc::new(FileSessionStore::open(&settings.session_file));
    let auth = AuthContext::from_store(store, Arc::new(TerminalNavigator));
    let gateway = Arc::new(GatewayClient::from_settings(&settings, auth.clone())?);

    let requested = args.command.route();
    if auth.resolve_route(requested).await != requested && requested.is_protected() {
        bail!("not logged in; run `receipts login --credential <token>`");
    }

    match args.command {
        Command::Login { credential } => {
            match auth.login_with_credential(&gateway, &credential).await {
                LoginResult::Authenticated(profile) => println!("logged in as {}", profile.name),
                LoginResult::Rejected => bail!("credential rejected"),
                LoginResult::Failed(report) => bail!(render::failure(&report)),
            }
        }
        Command::Logout => {
            auth.logout().await;
        }
        Command::Whoami => match auth.profile() {
            Some(profile) => println!("{} <{}>", profile.name, profile.picture_url),
            None => bail!("not logged in"),
        },
        Command::Upload { path } => {
            let form = UploadForm::with_file(UploadFile::from_path(&path).await?);
            let machine = SubmissionMachine::new(gateway, auth);
            let state = machine.submit(&form).await;
            println!("{}", render::submission(&machine.view().await));
            if matches!(state, SubmissionState::Failed(_)) {
                bail!("upload failed");
            }
        }
        Command::List {
            supermarket,
            item,
            min_date,
            max_date,
        } => {
            let form = SearchForm {
                supermarket,
                item,
                min_date,
                max_date,
            };
            let listing = ListingController::new(gateway, auth);
            if form == SearchForm::default() {
                listing.load_initial().await;
            } else {
                listing.submit_form(&form).await;
            }
            println!("{}", render::listing(&listing.view().await));
            if listing.inline_error().await.is_some() {
                bail!("listing failed");
            }
        }
        Command::Show { id, highlight } => {
            let detail = DetailController::with_reporter(gateway, auth, Arc::new(TerminalReporter));
            detail.open(ReceiptId(id)).await;
            let highlight = highlight.map(HighlightTerm::new).unwrap_or_default();
            match detail.view(&highlight).await {
                Some(view) => println!("{}", render::detail(&view)),
                None => bail!("receipt {id} could not be shown"),
            }
        }
    }

    Ok(())
}
