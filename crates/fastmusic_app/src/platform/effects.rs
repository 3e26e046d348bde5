use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use fastmusic_core::{Effect, Msg};
use fastmusic_engine::{BackendError, EngineEvent, EngineHandle};
use fm_logging::{fm_debug, fm_error, fm_info, fm_warn};

use super::app::Event;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Hands effects to the engine and feeds its completions back as messages.
///
/// An effect the engine refuses comes back at once as a failed completion,
/// so the pending set and the in-flight search still get released.
pub struct EffectRunner {
    engine: EngineHandle,
    events: mpsc::Sender<Event>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, events: mpsc::Sender<Event>) -> Self {
        let runner = Self { engine, events };
        runner.spawn_event_loop(runner.events.clone());
        runner
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            if let Err(err) = self.submit(effect.clone()) {
                self.report(refused(effect, err));
            }
        }
    }

    fn submit(&self, effect: Effect) -> Result<(), BackendError> {
        match effect {
            Effect::Search { search_id, query } => {
                fm_info!("Search search_id={} query={:?}", search_id, query);
                self.engine.enqueue_search(search_id, query)
            }
            Effect::Download(job) => {
                fm_info!(
                    "Download id={} quality={} locator_len={}",
                    job.id,
                    job.request.quality.as_wire(),
                    job.request.locator.as_str().len()
                );
                self.engine.enqueue_download(job)
            }
        }
    }

    fn report(&self, event: EngineEvent) {
        let Some(msg) = msg_from_event(event) else {
            return;
        };
        if self.events.send(Event::Msg(msg)).is_err() {
            fm_error!("session closed, dropping engine failure");
        }
    }

    fn spawn_event_loop(&self, events: mpsc::Sender<Event>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            let Some(event) = engine.recv_timeout(POLL_INTERVAL) else {
                continue;
            };
            let Some(msg) = msg_from_event(event) else {
                continue;
            };
            if events.send(Event::Msg(msg)).is_err() {
                fm_debug!("session closed, stopping engine event loop");
                break;
            }
        });
    }
}

/// The completion an effect stands for when the engine would not take it.
fn refused(effect: Effect, err: BackendError) -> EngineEvent {
    match effect {
        Effect::Search { search_id, .. } => EngineEvent::SearchCompleted {
            search_id,
            result: Err(err),
        },
        Effect::Download(job) => EngineEvent::DownloadCompleted {
            id: job.id,
            result: Err(err),
        },
    }
}

/// Maps a completion to the message `update` expects. Errors become their
/// user-facing text and saved files their name.
pub fn msg_from_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::SearchCompleted { search_id, result } => Some(Msg::SearchCompleted {
            search_id,
            result: result.map_err(|err| {
                fm_warn!("Search {} failed: {} ({})", search_id, err.message, err.kind);
                err.message
            }),
        }),
        EngineEvent::DownloadCompleted { id, result } => {
            let result = match result {
                Ok(saved) => {
                    fm_info!("Download {} saved as {:?}", id, saved.path);
                    Ok(saved.file_name)
                }
                Err(err) => Err(err.message),
            };
            Some(Msg::DownloadFinished { id, result })
        }
        EngineEvent::HealthChecked { .. } => None,
    }
}
