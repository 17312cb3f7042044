use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use emergency_core::{RequestAction, RequestFeed, RequestId, RequestStatus};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hospital_desk::render::{render_list, render_profile};
use hospital_desk::{
    ActionOutcome, ChannelNotifier, DeskConfig, EmergencyApi, LivePollingController, Notification,
    RequestListController, RestClient, SessionContext,
};

#[derive(Parser)]
#[command(name = "hospital-desk", version, about = "Painel de emergências do hospital")]
struct Cli {
    /// URL base da API (sobrepõe HOSPITAL_DESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Intervalo da atualização ao vivo, em segundos
    #[arg(long, global = true)]
    poll_secs: Option<u64>,

    /// Logs em JSON
    #[arg(long, global = true, env = "HOSPITAL_DESK_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solicitações pendentes próximas, atualizadas periodicamente
    Live,
    /// Lista as solicitações em um status
    List { status: RequestStatus },
    /// Aceita uma solicitação pendente
    Accept { id: String },
    /// Marca uma solicitação finalizada como resolvida
    Resolve { id: String },
    /// Mostra a rota até o paciente
    Navigate {
        id: String,
        #[arg(long, default_value = "accepted")]
        status: RequestStatus,
    },
    /// Perfil do hospital
    Profile,
    /// Painel resumido (JSON)
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = DeskConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(secs) = cli.poll_secs {
        config.poll_interval_secs = secs;
    }
    let config = config.validated()?;

    let session = Arc::new(SessionContext::new(config.token.clone()));
    let api: Arc<dyn EmergencyApi> = Arc::new(
        RestClient::new(&config, session).context("Falha ao criar o cliente HTTP")?,
    );
    let (notifier, mut notifications) = ChannelNotifier::new();
    let notifier = Arc::new(notifier);

    info!("Backend: {}", config.api_base_url);

    let result = match cli.command {
        Command::Live => {
            let list = Arc::new(RequestListController::new(RequestFeed::Live, api, notifier));
            run_live(list, &config, &mut notifications).await
        }
        Command::List { status } => {
            let list = RequestListController::new(RequestFeed::for_status(status), api, notifier);
            let loaded = list.load().await;
            if loaded.is_ok() {
                println!("{}", render_list(&list.snapshot()));
            }
            loaded.map(|_| ()).map_err(Into::into)
        }
        Command::Accept { id } => {
            let list = RequestListController::new(RequestFeed::Live, api, notifier);
            run_action(&list, id, RequestAction::Accept).await
        }
        Command::Resolve { id } => {
            let feed = RequestFeed::Status(RequestStatus::Finalized);
            let list = RequestListController::new(feed, api, notifier);
            run_action(&list, id, RequestAction::Resolve).await
        }
        Command::Navigate { id, status } => {
            let list = RequestListController::new(RequestFeed::for_status(status), api, notifier);
            run_action(&list, id, RequestAction::Navigate).await
        }
        Command::Profile => {
            let profile = api.hospital_profile().await?;
            println!("{}", render_profile(&profile));
            Ok(())
        }
        Command::Dashboard => {
            let dashboard = api.dashboard().await?;
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
            Ok(())
        }
    };

    print_pending(&mut notifications);
    result
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_live(
    list: Arc<RequestListController>,
    config: &DeskConfig,
    notifications: &mut UnboundedReceiver<Notification>,
) -> Result<()> {
    let polling = LivePollingController::new(Arc::clone(&list), config.poll_interval());
    let mut updates = list.subscribe();

    // Falhas da carga inicial já chegam como notificação
    let _ = polling.activate().await;
    println!("{}", render_list(&list.snapshot()));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if !snapshot.loading {
                    println!("\n{}", render_list(&snapshot));
                }
            }
            Some(notification) = notifications.recv() => println!("{}", notification),
        }
    }

    polling.teardown();
    info!("Painel encerrado");
    Ok(())
}

async fn run_action(list: &RequestListController, id: String, action: RequestAction) -> Result<()> {
    list.load().await?;

    let outcome = list.perform_action_on(&RequestId::new(id), action).await?;
    match outcome {
        ActionOutcome::Navigation { url } => println!("{}", url),
        ActionOutcome::Completed { next_status, .. } => {
            println!("Novo status: {}", next_status);
            println!("{}", render_list(&list.snapshot()));
        }
    }
    Ok(())
}

fn print_pending(notifications: &mut UnboundedReceiver<Notification>) {
    while let Ok(notification) = notifications.try_recv() {
        println!("{}", notification);
    }
}
