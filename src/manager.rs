//! Background audio playback manager.
//!
//! [`BackgroundAudio`] plays one looping background sound at a time. All of
//! its state lives on a dedicated worker thread: the output context, the
//! current-source slot and a generation counter. `play` and `stop` only send
//! commands; decode completions are routed back through the same command
//! channel, so every mutation of the slot is serialized on one thread.
//!
//! # Replace, never overlap
//!
//! `play` stops the current source before anything else happens, so a new
//! request silences the old sound even while the new one is still decoding.
//! Every `play` and `stop` bumps the generation; a decode that completes for
//! an older generation is discarded (see [`StaleCompletionPolicy`]).

use crate::audio_data::{AudioDecoder, DecodeRequest, DecodedAudio, SymphoniaDecoder};
use crate::config::{OutputInit, PlaybackDesc, StaleCompletionPolicy};
use crate::error::{BacktrackError, Result};
use crate::events::PlaybackEvent;
use crate::output::{AudioOutput, CpalOutput, SourceHandle};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Observable state of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No source is audible
    Idle,
    /// The source started by the `play` call with this generation is audible
    Playing { generation: u64 },
}

enum Command {
    Play(Arc<[u8]>),
    Stop,
    DecodeFinished {
        generation: u64,
        result: Result<DecodedAudio>,
    },
    QueryState(Sender<PlaybackState>),
    Shutdown,
}

struct CurrentSource<S> {
    generation: u64,
    handle: S,
}

type OutputFactory<O> = Box<dyn FnMut() -> Result<O> + Send>;

struct PlaybackCore<O: AudioOutput, D: AudioDecoder> {
    output: Option<O>,
    output_factory: OutputFactory<O>,
    decoder: D,
    current: Option<CurrentSource<O::Source>>,
    generation: u64,
    stale_completions: StaleCompletionPolicy,
    command_sender: Sender<Command>,
    event_sender: Sender<PlaybackEvent>,
}

impl<O: AudioOutput, D: AudioDecoder> PlaybackCore<O, D> {
    /// Events are dropped once the queue is full, so an undrained
    /// receiver never grows without bound.
    fn emit(&self, event: PlaybackEvent) {
        if let Err(TrySendError::Full(event)) = self.event_sender.try_send(event) {
            log::trace!("Event queue full, dropping {:?}", event);
        }
    }

    /// Open the output context if it is not open yet.
    fn ensure_output(&mut self) -> Result<()> {
        if self.output.is_some() {
            return Ok(());
        }

        let output = (self.output_factory)()?;
        log::info!(
            "Output context opened ({}Hz, {}ch)",
            output.sample_rate(),
            output.channels()
        );
        self.emit(PlaybackEvent::OutputOpened {
            sample_rate: output.sample_rate(),
            channels: output.channels(),
        });
        self.output = Some(output);
        Ok(())
    }

    fn clear_current(&mut self) {
        if let Some(mut current) = self.current.take() {
            current.handle.stop();
            log::debug!("Stopped source for generation {}", current.generation);
            self.emit(PlaybackEvent::SourceStopped {
                generation: current.generation,
            });
        }
    }

    fn play(&mut self, bytes: Arc<[u8]>) {
        self.generation += 1;
        let generation = self.generation;

        self.clear_current();

        if bytes.is_empty() {
            log::debug!("Play {} with empty input, staying idle", generation);
            return;
        }

        if let Err(e) = self.ensure_output() {
            log::error!("Failed to open output context: {}", e);
            self.emit(PlaybackEvent::OutputError {
                error: e.to_string(),
            });
            return;
        }

        let target_sample_rate = self.output.as_ref().map(|output| output.sample_rate());
        let completion_sender = self.command_sender.clone();

        log::debug!("Submitting {} bytes for generation {}", bytes.len(), generation);
        self.emit(PlaybackEvent::DecodeSubmitted {
            generation,
            bytes: bytes.len(),
        });

        self.decoder.submit(
            DecodeRequest {
                bytes,
                target_sample_rate,
            },
            Box::new(move |result| {
                let _ = completion_sender.send(Command::DecodeFinished { generation, result });
            }),
        );
    }

    fn stop(&mut self) {
        self.generation += 1;
        self.clear_current();
    }

    fn decode_finished(&mut self, generation: u64, result: Result<DecodedAudio>) {
        let audio = match result {
            Ok(audio) => audio,
            Err(e) => {
                log::error!("Error decoding audio data for generation {}: {}", generation, e);
                self.emit(PlaybackEvent::DecodeFailed {
                    generation,
                    error: e.to_string(),
                });
                return;
            }
        };

        if generation != self.generation {
            match self.stale_completions {
                StaleCompletionPolicy::Discard => {
                    log::debug!(
                        "Discarding decode for generation {} (latest is {})",
                        generation,
                        self.generation
                    );
                    self.emit(PlaybackEvent::StaleDecodeDiscarded {
                        generation,
                        latest: self.generation,
                    });
                    return;
                }
                StaleCompletionPolicy::LastDecodeWins => {
                    log::warn!(
                        "Accepting stale decode for generation {} (latest is {})",
                        generation,
                        self.generation
                    );
                }
            }
        }

        let Some(output) = self.output.as_ref() else {
            log::error!("Decode for generation {} finished without an output", generation);
            return;
        };

        let mut source = match output.create_source(audio, true) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Failed to create source for generation {}: {}", generation, e);
                self.emit(PlaybackEvent::OutputError {
                    error: e.to_string(),
                });
                return;
            }
        };

        // Only reachable with a source present under LastDecodeWins.
        self.clear_current();

        if let Err(e) = source.start() {
            log::error!("Failed to start source for generation {}: {}", generation, e);
            self.emit(PlaybackEvent::OutputError {
                error: e.to_string(),
            });
            return;
        }

        log::debug!("Source for generation {} is now playing", generation);
        self.current = Some(CurrentSource {
            generation,
            handle: source,
        });
        self.emit(PlaybackEvent::SourceStarted { generation });
    }

    fn state(&self) -> PlaybackState {
        match &self.current {
            Some(current) if current.handle.is_active() => PlaybackState::Playing {
                generation: current.generation,
            },
            _ => PlaybackState::Idle,
        }
    }

    fn run(mut self, commands: Receiver<Command>) {
        for command in commands.iter() {
            match command {
                Command::Play(bytes) => self.play(bytes),
                Command::Stop => self.stop(),
                Command::DecodeFinished { generation, result } => {
                    self.decode_finished(generation, result)
                }
                Command::QueryState(reply) => {
                    let _ = reply.send(self.state());
                }
                Command::Shutdown => break,
            }
        }

        self.stop();
        log::debug!("Playback worker exiting");
    }
}

/// Single-slot looping background audio player.
///
/// Owns its worker thread; dropping it stops playback and joins the worker.
pub struct BackgroundAudio {
    command_sender: Sender<Command>,
    event_receiver: Receiver<PlaybackEvent>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundAudio {
    /// Play through the default cpal device, decoding with symphonia.
    pub fn open_default(desc: PlaybackDesc) -> Result<Self> {
        desc.validate()?;
        let decoder = SymphoniaDecoder::new(desc.decode_options(), desc.decode_workers)?;
        let output_desc = desc.clone();
        Self::with_backend(desc, move || CpalOutput::open(&output_desc), decoder)
    }

    /// Spawn the manager with an injected output and decoder.
    ///
    /// `output_factory` runs on the worker thread, so the output itself does
    /// not need to be `Send`. It is called once on success; under
    /// [`OutputInit::Lazy`] a failed call is retried on the next `play`.
    pub fn with_backend<O, D, F>(desc: PlaybackDesc, output_factory: F, decoder: D) -> Result<Self>
    where
        O: AudioOutput + 'static,
        D: AudioDecoder + 'static,
        F: FnMut() -> Result<O> + Send + 'static,
    {
        desc.validate()?;

        let (command_sender, command_receiver) = crossbeam_channel::unbounded();
        let (event_sender, event_receiver) = crossbeam_channel::bounded(desc.event_capacity);
        let (ready_sender, ready_receiver) = crossbeam_channel::bounded::<Result<()>>(1);

        let core_command_sender = command_sender.clone();
        let output_init = desc.output_init;
        let stale_completions = desc.stale_completions;

        let worker = thread::Builder::new()
            .name("backtrack-playback".to_string())
            .spawn(move || {
                let mut core = PlaybackCore::<O, D> {
                    output: None,
                    output_factory: Box::new(output_factory),
                    decoder,
                    current: None,
                    generation: 0,
                    stale_completions,
                    command_sender: core_command_sender,
                    event_sender,
                };

                if output_init == OutputInit::Eager {
                    if let Err(e) = core.ensure_output() {
                        let _ = ready_sender.send(Err(e));
                        return;
                    }
                }
                let _ = ready_sender.send(Ok(()));

                core.run(command_receiver);
            })
            .map_err(|e| BacktrackError::Engine(format!("Failed to spawn playback worker: {}", e)))?;

        match ready_receiver.recv() {
            Ok(Ok(())) => Ok(Self {
                command_sender,
                event_receiver,
                worker: Some(worker),
            }),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(BacktrackError::Engine(
                    "Playback worker exited during startup".to_string(),
                ))
            }
        }
    }

    fn send(&self, command: Command) {
        if self.command_sender.send(command).is_err() {
            log::warn!("Playback worker is gone, dropping command");
        }
    }

    /// Replace whatever is playing with `bytes`, looped indefinitely.
    ///
    /// Returns before decoding finishes. Empty input just stops playback.
    /// Failures are reported through [`events`](Self::events).
    pub fn play(&self, bytes: impl Into<Arc<[u8]>>) {
        self.send(Command::Play(bytes.into()));
    }

    /// Stop the current source, if any.
    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Current state, answered after every previously issued command.
    pub fn state(&self) -> Result<PlaybackState> {
        let (reply_sender, reply_receiver) = crossbeam_channel::bounded(1);
        self.command_sender
            .send(Command::QueryState(reply_sender))
            .map_err(|_| BacktrackError::Engine("Playback worker is gone".to_string()))?;
        reply_receiver
            .recv()
            .map_err(|_| BacktrackError::Engine("Playback worker is gone".to_string()))
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state(), Ok(PlaybackState::Playing { .. }))
    }

    /// Diagnostic event stream.
    ///
    /// Holds at most `PlaybackDesc::event_capacity` undrained events;
    /// anything emitted past that is dropped.
    pub fn events(&self) -> &Receiver<PlaybackEvent> {
        &self.event_receiver
    }

    /// Drain all pending events.
    pub fn poll_events(&self) -> Vec<PlaybackEvent> {
        self.event_receiver.try_iter().collect()
    }
}

impl Drop for BackgroundAudio {
    fn drop(&mut self) {
        let _ = self.command_sender.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Playback worker panicked");
            }
        }
    }
}
