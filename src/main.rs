mod app;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::app_settings::AppSettings;
use crate::state::messages::{NetworkRequest, NetworkResponse, StoreEvent, StorePath, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crate::state::refresher::PeriodicRefresher;
use crate::state::subscription::SubscriptionWorker;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use groupstage_core::auth::AuthClient;
use groupstage_core::store::RealtimeDb;
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal();

    tui_logger::init_logger(log::LevelFilter::Trace)?;
    let settings = AppSettings::load();
    tui_logger::set_default_level(settings.log_level);

    let db = settings
        .database_url
        .as_deref()
        .map(|url| RealtimeDb::new(url, &settings.root));
    let auth = settings
        .api_key
        .as_deref()
        .map(|key| AuthClient::new(&settings.auth_url, key));
    match &db {
        Some(db) => info!("using realtime database at {}", db.endpoint("")),
        None => info!("no database configured; running local-only"),
    }

    let app = Arc::new(Mutex::new(App::new(settings)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);
    let (store_evt_tx, store_evt_rx) = mpsc::channel::<StoreEvent>(100);

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    // Input handler thread
    tasks.push(tokio::spawn(input_handler_task(ui_event_tx.clone())));

    // Live subscriptions and the periodic resync only exist with a database
    if let Some(db) = &db {
        for path in [StorePath::Groups, StorePath::Matches] {
            let worker = SubscriptionWorker {
                db: db.clone(),
                path,
                events: store_evt_tx.clone(),
            };
            tasks.push(tokio::spawn(worker.run()));
        }
        let periodic_updater = PeriodicRefresher::new(network_req_tx.clone());
        tasks.push(tokio::spawn(periodic_updater.run()));
    }
    drop(store_evt_tx);

    // Network thread
    let network_worker = NetworkWorker::new(db, auth, network_req_rx, network_resp_tx);
    tasks.push(tokio::spawn(network_worker.run()));

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx, store_evt_rx).await;

    for task in tasks {
        task.abort();
    }

    Ok(())
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("groupstage {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "groupstage - four-group tournament scoreboard

Usage:
  groupstage
  groupstage --help
  groupstage --version

Environment:
  GROUPSTAGE_DATABASE_URL  Realtime database base URL (unset = local-only)
  GROUPSTAGE_API_KEY       Web API key used for admin sign-in
  GROUPSTAGE_AUTH_URL      Sign-in endpoint override
  GROUPSTAGE_ROOT          Database node holding the tournament (default tournament)
  GROUPSTAGE_MODE          matches or manual (default matches with a database, manual without)
  GROUPSTAGE_DATA_DIR      Directory for the local cache (default ~/.config/groupstage)
  GROUPSTAGE_LOG           Log level: error, warn, info, debug, trace (default info)"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    mut store_events: mpsc::Receiver<StoreEvent>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw = handle_network_response(response, &app, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(store_event) = store_events.recv() => {
                app.lock().await.on_store_event(store_event);
                if !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => true,
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::Persisted { count } => app.lock().await.on_persisted(count),
        NetworkResponse::SignedIn { session } => app.lock().await.on_signed_in(session),
        NetworkResponse::SignedOut => app.lock().await.on_signed_out(),
        NetworkResponse::Resynced { groups, matches } => app.lock().await.on_resynced(groups, matches),
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            app.lock().await.on_error(message);
        }
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::Hide);
    let _ = execute!(stdout, terminal::EnterAlternateScreen);
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = terminal::enable_raw_mode();
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
