use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use fastmusic_core::{update, AppState, Msg};
use fastmusic_engine::{EngineEvent, EngineHandle};
use fm_logging::{fm_debug, fm_info};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::input::{parse_line, LineCommand, HELP};
use super::render::{result_table, Renderer};
use crate::cli::CliCommand;

/// Everything the session loop reacts to arrives on one channel.
pub enum Event {
    Msg(Msg),
    Line(String),
    InputClosed,
}

pub fn run_app(config: &AppConfig, command: CliCommand) -> Result<ExitCode> {
    let engine = EngineHandle::new(config.engine_config())
        .with_context(|| format!("cannot use backend {}", config.backend_url))?;
    fm_info!(
        "backend={} output_dir={:?} quality={}",
        config.backend_url,
        config.output_dir,
        config.quality
    );

    match command {
        CliCommand::Health => check_health(&engine, config),
        command => run_session(engine, config, command),
    }
}

fn run_session(engine: EngineHandle, config: &AppConfig, command: CliCommand) -> Result<ExitCode> {
    let (event_tx, event_rx) = mpsc::channel();
    let runner = EffectRunner::new(engine, event_tx.clone());
    let mut session = Session::new(runner, event_rx);
    session.dispatch(Msg::QualitySelected(config.quality));

    match command {
        CliCommand::Search { query, download } => {
            session.dispatch(Msg::QueryChanged(query.join(" ")));
            session.dispatch(Msg::SearchSubmitted);
            session.wait_until_idle()?;
            if !download.is_empty() {
                session.download_rows(&download);
                session.wait_until_idle()?;
            }
        }
        CliCommand::Url { url } => {
            session.dispatch(Msg::UrlChanged(url));
            session.dispatch(Msg::UrlSubmitted);
            session.wait_until_idle()?;
        }
        CliCommand::Get { video_id, title } => {
            let title = title.unwrap_or_else(|| video_id.clone());
            session.dispatch(Msg::DownloadClicked { video_id, title });
            session.wait_until_idle()?;
        }
        CliCommand::Interactive | CliCommand::Health => {
            spawn_stdin_reader(event_tx);
            session.interact()?;
            return Ok(ExitCode::SUCCESS);
        }
    }

    Ok(if session.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn check_health(engine: &EngineHandle, config: &AppConfig) -> Result<ExitCode> {
    engine.enqueue_health()?;
    let wait = Duration::from_secs(config.request_timeout_secs + config.connect_timeout_secs + 5);
    loop {
        match engine.recv_timeout(wait) {
            Some(EngineEvent::HealthChecked { result: Ok(status) }) => {
                println!("Backend {} is {}", config.backend_url, status);
                return Ok(ExitCode::SUCCESS);
            }
            Some(EngineEvent::HealthChecked { result: Err(err) }) => {
                println!("error: {err}");
                return Ok(ExitCode::FAILURE);
            }
            Some(_) => continue,
            None => bail!("no answer from the engine"),
        }
    }
}

fn spawn_stdin_reader(events: mpsc::Sender<Event>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if events.send(Event::Line(line)).is_err() {
                return;
            }
        }
        let _ = events.send(Event::InputClosed);
    });
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    events: mpsc::Receiver<Event>,
    /// Set once any operation reports an error.
    failed: bool,
}

impl Session {
    fn new(runner: EffectRunner, events: mpsc::Receiver<Event>) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer: Renderer::new(),
            events,
            failed: false,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let error_before = self.state.view().error;
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.run(effects);

        if state.consume_dirty() {
            let view = state.view();
            if view.error.is_some() && view.error != error_before {
                self.failed = true;
            }
            for line in self.renderer.render(&view) {
                println!("{line}");
            }
        }
        self.state = state;
    }

    fn download_rows(&mut self, rows: &[usize]) {
        let view = self.state.view();
        for &n in rows {
            match n.checked_sub(1).and_then(|index| view.row(index)) {
                Some(row) => self.dispatch(Msg::DownloadClicked {
                    video_id: row.id.clone(),
                    title: row.title.clone(),
                }),
                None => {
                    println!("error: no result {n}");
                    self.failed = true;
                }
            }
        }
    }

    fn wait_until_idle(&mut self) -> Result<()> {
        while !self.state.is_idle() {
            match self.events.recv() {
                Ok(Event::Msg(msg)) => self.dispatch(msg),
                Ok(Event::Line(_)) | Ok(Event::InputClosed) => {}
                Err(_) => bail!("engine event channel closed"),
            }
        }
        Ok(())
    }

    fn interact(&mut self) -> Result<()> {
        println!("{HELP}");
        loop {
            let event = self.events.recv().context("session channel closed")?;
            match event {
                Event::Msg(msg) => self.dispatch(msg),
                Event::Line(line) => match parse_line(&line) {
                    Ok(LineCommand::Quit) => break,
                    Ok(command) => self.run_line(command),
                    Err(message) => println!("error: {message}"),
                },
                Event::InputClosed => break,
            }
        }

        let pending = self.state.view().pending.len();
        if pending > 0 {
            println!("Waiting for {pending} download(s) to finish...");
        }
        fm_debug!("leaving interactive session");
        self.wait_until_idle()
    }

    fn run_line(&mut self, command: LineCommand) {
        match command {
            LineCommand::Search(query) => {
                self.dispatch(Msg::QueryChanged(query));
                self.dispatch(Msg::SearchSubmitted);
            }
            LineCommand::Get(rows) => self.download_rows(&rows),
            LineCommand::Url(url) => {
                self.dispatch(Msg::UrlChanged(url));
                self.dispatch(Msg::UrlSubmitted);
            }
            LineCommand::Quality(quality) => self.dispatch(Msg::QualitySelected(quality)),
            LineCommand::Results => {
                let view = self.state.view();
                if view.results.is_empty() {
                    println!("No results yet");
                }
                for line in result_table(&view.results) {
                    println!("{line}");
                }
            }
            LineCommand::Help => println!("{HELP}"),
            LineCommand::Quit | LineCommand::Empty => {}
        }
    }
}
