mod app;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::app_settings::AppSettings;
use crate::state::messages::{NotifierResponse, SocketCommand, UiEvent};
use crate::state::notifier::NotifierWorker;
use crate::state::refresher::ClockTicker;
use crate::state::socket::SocketWorker;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::{info, warn};
use siot_core::notifier::LegacyNotifier;
use siot_core::{ClientEvent, GameInfo, TransportEvent};
use std::io::Stdout;
use std::{io, panic};
use tokio::sync::mpsc;
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    let settings = AppSettings::load();

    tui_logger::init_logger(log::LevelFilter::Trace)?;

    let (client_evt_tx, client_evt_rx) = mpsc::unbounded_channel::<ClientEvent>();
    let mut app = App::new(settings, client_evt_tx)?;
    info!("uid {} watching {:?}", app.client.uid(), app.client.watched_sports());

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (socket_cmd_tx, socket_cmd_rx) = mpsc::channel::<SocketCommand>(100);
    let (socket_evt_tx, socket_evt_rx) = mpsc::channel::<TransportEvent>(100);
    let (notify_req_tx, notify_req_rx) = mpsc::channel::<GameInfo>(100);
    let (notify_resp_tx, notify_resp_rx) = mpsc::channel::<NotifierResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Socket thread
    let socket_worker = SocketWorker {
        url: app.client.endpoint().url(),
        auth_header: app.client.auth_header(),
        reconnect_interval: app.settings.reconnect_interval,
        commands: socket_cmd_rx,
        events: socket_evt_tx,
    };
    let socket_task = tokio::spawn(socket_worker.run());

    // Legacy notifier thread, only when a CGI endpoint is configured
    let notifier_task = app.settings.legacy_cgi_url.clone().map(|url| {
        let notifier = LegacyNotifier::new(
            url,
            app.client.school(),
            app.client.watched_sports().to_vec(),
            app.settings.legacy_team_map.clone(),
        );
        tokio::spawn(NotifierWorker::new(notifier, notify_req_rx, notify_resp_tx).run())
    });

    // Clock tick thread (every 60s)
    let ticker_task = tokio::spawn(ClockTicker::new(ui_event_tx.clone()).run());

    let notify_requests = notifier_task.as_ref().map(|_| notify_req_tx);

    main_ui_loop(
        terminal,
        &mut app,
        ui_event_rx,
        socket_cmd_tx,
        socket_evt_rx,
        client_evt_rx,
        notify_requests,
        notify_resp_rx,
    )
    .await;

    input_handler.abort();
    socket_task.abort();
    ticker_task.abort();
    if let Some(task) = notifier_task {
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
            println!("siot {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "siot - live college sports scores over WebSocket

Usage:
  siot
  siot --help
  siot --version

Environment:
  SIOT_URL              Full WebSocket URL (overrides SIOT_HOST/SIOT_PORT)
  SIOT_HOST             Service host (default localhost)
  SIOT_PORT             Service port (default 8000)
  SIOT_UID              Numeric device id (default: random six digits)
  SIOT_TOKEN            Bearer token sent on connect
  SIOT_SCHOOL           School to follow (default Montana)
  SIOT_SPORTS           Comma-separated sports, at most 8 (default Soccer (W))
  SIOT_RECONNECT_SECS   Seconds between reconnect attempts (default 5)
  SIOT_LOG              Log level: error, warn, info, debug, trace (default error)
  LEGACY_CGI_URL        Legacy status CGI; wins are posted here when set
  LEGACY_TEAM_MAP_JSON  JSON object mapping winner names to legacy codes"
}

#[allow(clippy::too_many_arguments)]
async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    mut ui_events: mpsc::Receiver<UiEvent>,
    socket_commands: mpsc::Sender<SocketCommand>,
    mut socket_events: mpsc::Receiver<TransportEvent>,
    mut client_events: mpsc::UnboundedReceiver<ClientEvent>,
    notify_requests: Option<mpsc::Sender<GameInfo>>,
    mut notify_responses: mpsc::Receiver<NotifierResponse>,
) {
    draw::draw(&mut terminal, app);

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                match ui_event {
                    UiEvent::KeyPressed(key_event) => keys::handle_key_bindings(key_event, app),
                    UiEvent::Resize | UiEvent::ClockTick => {}
                }
                draw::draw(&mut terminal, app);
            }

            Some(transport_event) = socket_events.recv() => {
                for text in app.on_transport(transport_event) {
                    if socket_commands.send(SocketCommand::Send(text)).await.is_err() {
                        warn!("socket worker is gone, dropping outbound message");
                    }
                }
                draw::draw(&mut terminal, app);
            }

            Some(client_event) = client_events.recv() => {
                if let Some(game) = app.on_client_event(client_event) {
                    forward_win(notify_requests.as_ref(), game).await;
                }
                draw::draw(&mut terminal, app);
            }

            Some(response) = notify_responses.recv() => {
                app.on_notifier_response(response);
                draw::draw(&mut terminal, app);
            }

            else => break,
        }
    }
}

/// Hand a win to the notifier worker. Returns false when it was dropped.
async fn forward_win(notify_requests: Option<&mpsc::Sender<GameInfo>>, game: GameInfo) -> bool {
    let Some(tx) = notify_requests else {
        return false;
    };
    match tx.send(game).await {
        Ok(()) => true,
        Err(e) => {
            warn!("notifier worker is gone, dropping win for game {}", e.0.id);
            false
        }
    }
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

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(
        stdout,
        cursor::Hide,
        terminal::EnterAlternateScreen,
        terminal::Clear(terminal::ClearType::All)
    )?;
    terminal::enable_raw_mode()
}

/// Best effort; also runs from the panic hook.
pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        cursor::MoveTo(0, 0),
        terminal::Clear(terminal::ClearType::All),
        terminal::LeaveAlternateScreen,
        cursor::Show
    );
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win(id: i64) -> GameInfo {
        GameInfo { id, sport: "Football".into(), winner: "Montana".into(), ..Default::default() }
    }

    #[tokio::test]
    async fn win_reaches_a_running_notifier() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(forward_win(Some(&tx), win(1)).await);
        assert_eq!(rx.recv().await.map(|g| g.id), Some(1));
    }

    #[tokio::test]
    async fn win_is_dropped_when_the_notifier_has_exited() {
        let (tx, rx) = mpsc::channel::<GameInfo>(1);
        drop(rx);
        assert!(!forward_win(Some(&tx), win(2)).await);
        assert!(!forward_win(None, win(3)).await);
    }
}
