//! Practice run service.
//!
//! Runs live in a per-id store. Each run sits behind its own mutex, and a
//! submission that finds the mutex held is rejected instead of queued, so at
//! most one mutation is ever in flight per run. Readers see the snapshot the
//! run last committed and never wait on the mutex. Runs never share state
//! with each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult, ErrorReport};
use crate::domain::models::{
    Message, Persona, PersonaTable, Run, RunId, RunSnapshot, RunsConfig, TURN_LIMIT,
};
use crate::domain::ports::{PersonaOracle, PersonaTurn, ReviewSynthesizer, SynthesisRequest};

/// Reply recorded when the persona oracle fails once.
pub const PERSONA_FALLBACK_REPLY: &str = "...";

/// Tunables for the run service.
#[derive(Debug, Clone, Copy)]
pub struct RunServiceConfig {
    pub idle_ttl: Duration,
    pub persona_timeout: Duration,
    /// Consecutive persona failures that fail the turn instead of falling back
    pub max_persona_failures: u32,
}

impl Default for RunServiceConfig {
    fn default() -> Self {
        Self::from(&RunsConfig::default())
    }
}

impl From<&RunsConfig> for RunServiceConfig {
    fn from(config: &RunsConfig) -> Self {
        Self {
            idle_ttl: Duration::from_secs(config.idle_ttl_secs),
            persona_timeout: Duration::from_secs(config.persona_timeout_secs),
            max_persona_failures: config.max_persona_failures.max(1),
        }
    }
}

/// What a successful submission produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub snapshot: RunSnapshot,
    pub reply: Message,
    /// The persona failed and the placeholder reply was recorded instead
    pub fallback: bool,
    /// Set when this turn completed the run but its review could not be built
    pub review_error: Option<ErrorReport>,
}

/// A run and the last state it committed.
struct RunSlot {
    run: Mutex<Run>,
    committed: watch::Sender<RunSnapshot>,
}

impl RunSlot {
    fn new(run: Run) -> Self {
        let (committed, _) = watch::channel(run.snapshot());
        Self {
            run: Mutex::new(run),
            committed,
        }
    }

    fn publish(&self, run: &Run) -> RunSnapshot {
        let snapshot = run.snapshot();
        self.committed.send_replace(snapshot.clone());
        snapshot
    }
}

type RunHandle = Arc<RunSlot>;

/// Owns every live practice run.
pub struct RunService {
    runs: RwLock<HashMap<RunId, RunHandle>>,
    personas: PersonaTable,
    persona_oracle: Arc<dyn PersonaOracle>,
    synthesizer: Arc<dyn ReviewSynthesizer>,
    config: RunServiceConfig,
}

impl RunService {
    pub fn new(
        persona_oracle: Arc<dyn PersonaOracle>,
        synthesizer: Arc<dyn ReviewSynthesizer>,
        config: RunServiceConfig,
    ) -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            personas: PersonaTable,
            persona_oracle,
            synthesizer,
            config,
        }
    }

    pub fn personas(&self) -> &'static [Persona] {
        self.personas.all()
    }

    /// Start a run against the given persona, or a random one.
    #[instrument(skip(self))]
    pub async fn start(&self, persona_id: Option<&str>) -> DomainResult<RunSnapshot> {
        let persona = match persona_id {
            Some(id) => self
                .personas
                .get(id)
                .ok_or_else(|| DomainError::Input(format!("unknown persona `{id}`")))?,
            None => self.personas.random(&mut rand::thread_rng()),
        };

        self.evict_idle().await;

        let run = Run::new(persona.id);
        let snapshot = run.snapshot();
        self.runs
            .write()
            .await
            .insert(run.id.clone(), Arc::new(RunSlot::new(run)));

        info!(run_id = %snapshot.run_id, persona = persona.id, "Started practice run");
        Ok(snapshot)
    }

    /// Abandon `prior` and start a fresh run.
    pub async fn start_replacing(
        &self,
        prior: &RunId,
        persona_id: Option<&str>,
    ) -> DomainResult<RunSnapshot> {
        if self.runs.write().await.remove(prior).is_some() {
            debug!(run_id = %prior, "Abandoned prior run");
        }
        self.start(persona_id).await
    }

    /// Play one turn: the user's message and the persona's reply.
    ///
    /// The transcript is untouched unless the whole turn succeeds. The turn
    /// that completes the run also builds its review; a failed review leaves
    /// the run completed and is reported in the outcome.
    #[instrument(skip(self, text), fields(run_id = %run_id))]
    pub async fn submit_user_message(&self, run_id: &RunId, text: &str) -> DomainResult<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::Input("message is empty".to_string()));
        }

        let handle = self.handle(run_id).await?;
        let mut run = handle.run.try_lock().map_err(|_| in_flight(run_id))?;
        run.ensure_accepts_turn()?;
        let persona = self.persona_of(&run)?;

        let turn = run.next_turn();
        let reply = tokio::time::timeout(
            self.config.persona_timeout,
            self.persona_oracle.respond(PersonaTurn {
                persona,
                turn,
                transcript: &run.transcript,
                user_message: text,
            }),
        )
        .await
        .unwrap_or_else(|_| {
            Err(DomainError::Timeout {
                operation: "persona oracle".to_string(),
                after_ms: millis(self.config.persona_timeout),
            })
        })
        .and_then(|reply| {
            if reply.trim().is_empty() {
                Err(DomainError::oracle_transient("persona sent an empty reply"))
            } else {
                Ok(reply)
            }
        });

        let (reply_text, fallback) = match reply {
            Ok(reply) => {
                run.consecutive_persona_failures = 0;
                (reply, false)
            }
            Err(err) => {
                run.consecutive_persona_failures += 1;
                run.touch();
                if run.consecutive_persona_failures >= self.config.max_persona_failures {
                    warn!(
                        failures = run.consecutive_persona_failures,
                        error = %err,
                        "Persona oracle keeps failing, rejecting turn"
                    );
                    return Err(err);
                }
                warn!(error = %err, "Persona oracle failed, using placeholder reply");
                (PERSONA_FALLBACK_REPLY.to_string(), true)
            }
        };

        let user_message = run.user_message(text);
        let reply = run.persona_message(&reply_text);
        run.commit_turn(user_message, reply.clone())?;
        handle.publish(&run);
        debug!(turn, fallback, "Turn committed");

        let review_error = if run.is_completed() {
            self.review(&mut run).await.err().map(|err| err.report())
        } else {
            None
        };

        Ok(TurnOutcome {
            snapshot: handle.publish(&run),
            reply,
            fallback,
            review_error,
        })
    }

    /// Discard a run that has not finished. No review is produced.
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn end_early(&self, run_id: &RunId) -> DomainResult<()> {
        let handle = self.handle(run_id).await?;
        {
            let run = handle.run.try_lock().map_err(|_| in_flight(run_id))?;
            if run.is_completed() {
                return Err(DomainError::InvalidTransition {
                    from: run.state().to_string(),
                    reason: "a completed run cannot be ended early".to_string(),
                });
            }
        }
        self.runs.write().await.remove(run_id);
        info!("Ended practice run early");
        Ok(())
    }

    /// Last committed view of a run. Does not wait for a turn in flight.
    pub async fn current_state(&self, run_id: &RunId) -> DomainResult<RunSnapshot> {
        let handle = self.handle(run_id).await?;
        let snapshot = handle.committed.borrow().clone();
        Ok(snapshot)
    }

    /// Build the review of a completed run whose review is missing.
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn retry_review(&self, run_id: &RunId) -> DomainResult<RunSnapshot> {
        let handle = self.handle(run_id).await?;
        let mut run = handle.run.try_lock().map_err(|_| in_flight(run_id))?;
        if !run.is_completed() {
            return Err(DomainError::InvalidTransition {
                from: run.state().to_string(),
                reason: format!("a review needs all {TURN_LIMIT} turns"),
            });
        }
        if run.review.is_none() {
            self.review(&mut run).await?;
        }
        run.touch();
        Ok(handle.publish(&run))
    }

    /// Number of runs in the store.
    pub async fn active_runs(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Drop runs idle for longer than the TTL. Runs with a turn in flight
    /// are kept.
    pub async fn evict_idle(&self) -> usize {
        let now = Utc::now();
        let ttl = self.config.idle_ttl;
        let mut runs = self.runs.write().await;
        let before = runs.len();
        runs.retain(|_, handle| {
            handle.run.try_lock().map_or(true, |run| {
                (now - run.last_active_at).to_std().unwrap_or_default() <= ttl
            })
        });
        let evicted = before - runs.len();
        if evicted > 0 {
            info!(evicted, "Evicted idle practice runs");
        }
        evicted
    }

    async fn handle(&self, run_id: &RunId) -> DomainResult<RunHandle> {
        self.runs
            .read()
            .await
            .get(run_id)
            .cloned()
            .ok_or_else(|| DomainError::RunNotFound(run_id.to_string()))
    }

    fn persona_of(&self, run: &Run) -> DomainResult<&'static Persona> {
        self.personas
            .get(&run.persona_id)
            .ok_or_else(|| DomainError::Input(format!("unknown persona `{}`", run.persona_id)))
    }

    async fn review(&self, run: &mut Run) -> DomainResult<()> {
        let persona = *self.persona_of(run)?;
        let request = SynthesisRequest::practice_run(run.transcript.clone(), persona);
        match self.synthesizer.synthesize(request).await {
            Ok(review) => {
                info!(run_id = %run.id, moves = review.move_count(), "Practice run reviewed");
                run.review = Some(review);
                Ok(())
            }
            Err(err) => {
                warn!(run_id = %run.id, error = %err, "Practice run review failed");
                Err(err)
            }
        }
    }
}

fn in_flight(run_id: &RunId) -> DomainError {
    DomainError::InvalidTransition {
        from: "in_flight".to_string(),
        reason: format!("run {run_id} is already processing a submission"),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
