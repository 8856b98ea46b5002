use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use salesdesk_appcore::developer::DeveloperDashboard;
use salesdesk_appcore::sales::SalesDashboard;
use salesdesk_appcore::script_manager::error_notice;
use salesdesk_appcore::service::{DashboardService, Screen};
use salesdesk_core::notice::Notice;
use salesdesk_core::transcript::TranscriptEntry;
use salesdesk_core::types::ScriptId;
use salesdesk_engine::session::{SendError, SessionStatus, StartOutcome};
use salesdesk_runtime::call_setup::NoMediaSdk;
use salesdesk_runtime::config_store::ConfigStore;
use salesdesk_runtime::kv::JsonFileKv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

const HELP: &str = "\
commands:
  call | end | say <text> | mute | status | transcript
  dev                        open the developer login
  login <user> <password>    sign in as developer
  cancel | logout
  scripts | select <id> | new
  name <text> | prompt <text> | body <text> | save
  log                        developer debug log
  help | quit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Call,
    End,
    Say(String),
    Mute,
    Status,
    Transcript,
    Dev,
    Login { username: String, password: String },
    Cancel,
    Logout,
    Scripts,
    Select(String),
    New,
    Name(String),
    Prompt(String),
    Body(String),
    Save,
    Log,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let cmd = match word {
        "call" => Command::Call,
        "end" => Command::End,
        "say" => Command::Say(rest.to_string()),
        "mute" => Command::Mute,
        "status" => Command::Status,
        "transcript" => Command::Transcript,
        "dev" => Command::Dev,
        "login" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(u), Some(p)) => Command::Login {
                    username: u.to_string(),
                    password: p.to_string(),
                },
                _ => return Err("usage: login <user> <password>".into()),
            }
        }
        "cancel" => Command::Cancel,
        "logout" => Command::Logout,
        "scripts" => Command::Scripts,
        "select" if !rest.is_empty() => Command::Select(rest.to_string()),
        "select" => return Err("usage: select <id>".into()),
        "new" => Command::New,
        "name" => Command::Name(rest.to_string()),
        "prompt" => Command::Prompt(rest.to_string()),
        "body" => Command::Body(rest.to_string()),
        "save" => Command::Save,
        "log" => Command::Log,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command {other:?}; try `help`")),
    };
    Ok(cmd)
}

fn print_notice(notice: &Notice) {
    let marker = if notice.destructive { "!" } else { "*" };
    println!("[{marker}] {}: {}", notice.title, notice.description);
}

fn spawn_notice_printer(mut rx: broadcast::Receiver<Notice>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notice) => print_notice(&notice),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("dropped {n} notices");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    });
}

/// Whichever dashboard currently owns the call controls.
enum CallScreen<'a> {
    Sales(&'a SalesDashboard),
    Developer(&'a DeveloperDashboard),
}

impl CallScreen<'_> {
    async fn start_call(&self) -> anyhow::Result<StartOutcome> {
        match self {
            CallScreen::Sales(d) => Ok(d.start_call().await?),
            CallScreen::Developer(d) => d.start_call().await,
        }
    }

    async fn end_call(&self) {
        match self {
            CallScreen::Sales(d) => d.end_call().await,
            CallScreen::Developer(d) => d.end_call().await,
        }
    }

    fn send_message(&self, text: &str) -> Result<(), SendError> {
        match self {
            CallScreen::Sales(d) => d.send_message(text),
            CallScreen::Developer(d) => d.send_message(text),
        }
    }

    fn toggle_mute(&self) -> bool {
        match self {
            CallScreen::Sales(d) => d.toggle_mute(),
            CallScreen::Developer(d) => d.toggle_mute(),
        }
    }

    fn status(&self) -> SessionStatus {
        match self {
            CallScreen::Sales(d) => d.status(),
            CallScreen::Developer(d) => d.status(),
        }
    }

    fn transcript(&self) -> Vec<TranscriptEntry> {
        match self {
            CallScreen::Sales(d) => d.transcript(),
            CallScreen::Developer(d) => d.transcript(),
        }
    }
}

fn call_screen(svc: &DashboardService) -> Option<CallScreen<'_>> {
    match svc.screen() {
        Screen::Sales => Some(CallScreen::Sales(svc.sales())),
        Screen::Developer { .. } => svc.developer().map(CallScreen::Developer),
        Screen::DeveloperLogin => None,
    }
}

fn print_status(status: &SessionStatus) {
    println!("{} | {}", status.label, status.headline);
    println!("  {}", status.detail);
    println!(
        "  muted={} listening={} agent_audio={} messages={}",
        status.muted, status.listening, status.agent_audio_tracks, status.transcript_len
    );
}

fn print_screen(svc: &DashboardService) {
    match svc.screen() {
        Screen::Sales => {
            let offer = svc.sales().offer();
            println!(
                "== AI Sales Assistant == {} ({}, margin {})",
                offer.product_name, offer.price, offer.margin
            );
        }
        Screen::DeveloperLogin => println!("== Developer Login == `login <user> <password>`"),
        Screen::Developer { username } => println!("== Developer Dashboard == {username}"),
    }
}

/// Runs one command. Returns `false` when the shell should exit.
async fn dispatch(svc: &mut DashboardService, cmd: Command) -> anyhow::Result<bool> {
    match cmd {
        Command::Quit => return Ok(false),
        Command::Help => println!("{HELP}"),

        Command::Call | Command::End | Command::Say(_) | Command::Mute | Command::Status
        | Command::Transcript => {
            let Some(screen) = call_screen(svc) else {
                println!("finish logging in or `cancel` first");
                return Ok(true);
            };
            match cmd {
                Command::Call => match screen.start_call().await {
                    Ok(StartOutcome::AlreadyActive) => println!("a call is already active"),
                    Ok(outcome) => log::debug!("start_call: {outcome:?}"),
                    Err(e) => println!("call failed: {e:#}"),
                },
                Command::End => screen.end_call().await,
                Command::Say(text) => match screen.send_message(&text) {
                    Ok(()) => {}
                    Err(SendError::NotConnected) => println!("not connected; `call` first"),
                    Err(SendError::EmptyMessage) => println!("usage: say <text>"),
                },
                Command::Mute => {
                    let muted = screen.toggle_mute();
                    println!("{}", if muted { "muted" } else { "unmuted" });
                }
                Command::Status => print_status(&screen.status()),
                Command::Transcript => {
                    for entry in screen.transcript() {
                        println!(
                            "{} [{}] {}",
                            entry.speaker.display_name(),
                            entry.timestamp.format("%H:%M:%S"),
                            entry.text
                        );
                    }
                }
                _ => {}
            }
        }

        Command::Dev => {
            svc.open_developer_login();
            print_screen(svc);
        }
        Command::Cancel => {
            svc.cancel_login();
            print_screen(svc);
        }
        Command::Login { username, password } => {
            if svc.screen() != Screen::DeveloperLogin {
                println!("open the login screen with `dev` first");
                return Ok(true);
            }
            match svc.login(&username, &password) {
                Ok(()) => {
                    if let Some(dev) = svc.developer() {
                        spawn_notice_printer(dev.simulator().subscribe());
                    }
                    print_screen(svc);
                }
                Err(e) => println!("login failed: {e}"),
            }
        }
        Command::Logout => {
            svc.logout()?;
            print_screen(svc);
        }

        Command::Scripts
        | Command::Select(_)
        | Command::New
        | Command::Name(_)
        | Command::Prompt(_)
        | Command::Body(_)
        | Command::Save
        | Command::Log => {
            let Some(dev) = svc.developer_mut() else {
                println!("developer login required");
                return Ok(true);
            };
            match cmd {
                Command::Scripts => {
                    let scripts = dev.scripts();
                    for s in scripts.scripts() {
                        let active = if scripts.is_selected(&s.id) { " (Active)" } else { "" };
                        println!("{}  {}{}  {}", s.id, s.name, active, s.modified_summary());
                    }
                    let draft = scripts.draft();
                    println!("editing: {:?} ({} chars)", draft.name, draft.prompt_text.len());
                }
                Command::Select(id) => {
                    if !dev.scripts_mut().select(&ScriptId::new(id.as_str())) {
                        println!("no script with id {id}");
                    }
                }
                Command::New => dev.scripts_mut().new_script(),
                Command::Name(v) => dev.scripts_mut().set_name(v),
                Command::Prompt(v) => dev.scripts_mut().set_prompt(v),
                Command::Body(v) => {
                    dev.scripts_mut()
                        .set_script_body(if v.is_empty() { None } else { Some(v) });
                }
                Command::Save => match dev.scripts_mut().save() {
                    Ok(notice) => print_notice(&notice),
                    Err(e) => print_notice(&error_notice(&e)),
                },
                Command::Log => {
                    for line in dev.debug_log() {
                        println!("{line}");
                    }
                }
                _ => {}
            }
        }
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let config_path = std::env::var_os("SALESDESK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("salesdesk.json"));
    let state_path = std::env::var_os("SALESDESK_STATE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("salesdesk-state.json"));
    log::info!(
        "config={} state={}",
        config_path.display(),
        state_path.display()
    );

    let cfg = ConfigStore::at_path(config_path)
        .load_or_default()
        .context("load config")?;
    let kv = Arc::new(JsonFileKv::at_path(state_path));
    let mut svc = DashboardService::new(cfg, kv, Arc::new(NoMediaSdk))?;

    spawn_notice_printer(svc.sales().simulator().subscribe());
    if let Some(dev) = svc.developer() {
        spawn_notice_printer(dev.simulator().subscribe());
    }

    print_screen(&svc);
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let cmd = match parse_command(&line) {
            Ok(cmd) => cmd,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };
        if !dispatch(&mut svc, cmd).await? {
            break;
        }
    }

    if let Some(dev) = svc.developer() {
        dev.close();
    }
    svc.sales().simulator().shutdown();
    Ok(())
}
