// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! JavaScript runtime implementation using boa_engine

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use boa_engine::context::ContextBuilder;
use boa_engine::job::{FutureJob, JobQueue, NativeJob};
use boa_engine::property::Attribute;
use boa_engine::{Context, JsResult, JsString, JsValue, NativeFunction, Source};
use boa_gc::{Finalize, Gc, GcRefCell, Trace};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use super::dom::{capture_wrapper, BLANK_PAGE, PRELUDE};
use super::timers::TimerQueue;
use super::ScriptHost;
use crate::error::{Error, Result};

/// Boa host configuration
#[derive(Debug, Clone)]
pub struct BoaHostConfig {
    /// How long the challenge may go without writing `ui_metrics` (virtual time)
    pub wait: Duration,
    /// Maximum loop iterations per call frame, further capped by the timeout
    pub loop_iteration_limit: u64,
    /// Maximum call depth
    pub recursion_limit: usize,
    /// Maximum timer callbacks fired in one evaluation
    pub max_timer_fires: usize,
}

impl Default for BoaHostConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(5),
            loop_iteration_limit: 10_000_000,
            recursion_limit: 512,
            max_timer_fires: 10_000,
        }
    }
}

/// Loop iterations granted per millisecond of evaluation timeout
const LOOP_ITERATIONS_PER_MS: u64 = 1_000;

/// Floor for the timeout-derived loop limit
const MIN_LOOP_ITERATIONS: u64 = 10_000;

/// Script host backed by an embedded boa engine with a stub DOM
///
/// Every evaluation builds a fresh `Context` on its own named thread and
/// drops it before the thread exits. A timed out evaluation is abandoned,
/// never joined, so the async runtime can shut down while the engine winds
/// down against its loop limit.
#[derive(Debug, Clone, Default)]
pub struct BoaHost {
    config: BoaHostConfig,
}

impl BoaHost {
    /// Create a new host
    pub fn new(config: BoaHostConfig) -> Self {
        Self { config }
    }

    /// Get host configuration
    pub fn config(&self) -> &BoaHostConfig {
        &self.config
    }

    /// Configuration for one evaluation, with the loop limit scaled to `timeout`
    fn budget(&self, timeout: Duration) -> BoaHostConfig {
        let scaled = u64::try_from(timeout.as_millis())
            .unwrap_or(u64::MAX)
            .saturating_mul(LOOP_ITERATIONS_PER_MS)
            .max(MIN_LOOP_ITERATIONS);
        BoaHostConfig {
            loop_iteration_limit: self.config.loop_iteration_limit.min(scaled),
            ..self.config.clone()
        }
    }
}

/// Start one evaluation on a dedicated thread
///
/// The result arrives on the returned channel. Nothing waits on the thread
/// handle, callers that care can poll it.
fn spawn_worker(
    script: String,
    user_agent: String,
    config: BoaHostConfig,
    deadline: Instant,
) -> Result<(oneshot::Receiver<Result<String>>, thread::JoinHandle<()>)> {
    let (tx, rx) = oneshot::channel();
    let handle = thread::Builder::new()
        .name("helicon-js".to_string())
        .spawn(move || {
            let result = run_challenge(&script, &user_agent, &config, deadline);
            // The receiver is gone once the caller timed out
            let _ = tx.send(result);
        })
        .map_err(|e| Error::challenge(format!("failed to start challenge worker: {}", e)))?;
    Ok((rx, handle))
}

#[async_trait]
impl ScriptHost for BoaHost {
    async fn evaluate(&self, script: &str, user_agent: &str, timeout: Duration) -> Result<String> {
        let config = self.budget(timeout);
        debug!(
            loop_iteration_limit = config.loop_iteration_limit,
            timeout_ms = timeout.as_millis() as u64,
            "starting challenge worker"
        );
        let deadline = Instant::now() + timeout;
        let (result, _handle) =
            spawn_worker(script.to_owned(), user_agent.to_owned(), config, deadline)?;

        match tokio::time::timeout(timeout, result).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::challenge("challenge worker exited without a result")),
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "challenge worker abandoned after timeout"
                );
                Err(Error::challenge(format!(
                    "evaluation exceeded {}ms",
                    timeout.as_millis()
                )))
            }
        }
    }
}

/// How the capture promise settled
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Resolved(String),
    Rejected(String),
    NotAString(String),
}

#[derive(Trace, Finalize)]
struct HostState {
    #[unsafe_ignore_trace]
    timers: TimerQueue,
    #[unsafe_ignore_trace]
    outcome: Option<Outcome>,
}

type SharedState = Gc<GcRefCell<HostState>>;

/// Run one challenge to completion on the current thread
///
/// Blocks until the capture settles, the timer queue runs dry, or `deadline`
/// passes. The wall-clock deadline is checked between every pump step.
pub fn run_challenge(
    script: &str,
    user_agent: &str,
    config: &BoaHostConfig,
    deadline: Instant,
) -> Result<String> {
    let started = Instant::now();
    let jobs = Rc::new(HostJobQueue::default());
    let mut context = ContextBuilder::new()
        .job_queue(jobs)
        .build()
        .map_err(|e| Error::challenge(format!("failed to create JS context: {}", e)))?;

    let limits = context.runtime_limits_mut();
    limits.set_loop_iteration_limit(config.loop_iteration_limit);
    limits.set_recursion_limit(config.recursion_limit);

    let state: SharedState = Gc::new(GcRefCell::new(HostState {
        timers: TimerQueue::with_max_fires(config.max_timer_fires),
        outcome: None,
    }));
    install_natives(&mut context, &state)?;

    register_string(&mut context, "__hostUserAgent", user_agent)?;
    register_string(&mut context, "__challengeSource", script)?;

    eval(&mut context, PRELUDE, "install browser environment")?;
    eval(&mut context, BLANK_PAGE, "write blank page")?;
    eval(&mut context, &capture_wrapper(config.wait), "start capture")?;

    loop {
        context.run_jobs();

        let outcome = state.borrow_mut().outcome.take();
        if let Some(outcome) = outcome {
            let timers = state.borrow();
            debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                virtual_ms = timers.timers.now_ms(),
                timers_fired = timers.timers.fired(),
                "challenge settled"
            );
            return settle(outcome);
        }

        if Instant::now() >= deadline {
            return Err(Error::challenge("evaluation deadline passed before capture"));
        }

        let next = state.borrow_mut().timers.pop_next();
        match next {
            Some(id) => {
                trace!(timer = id, "firing timer");
                eval(&mut context, &format!("__hostFire({})", id), "run timer")?;
            }
            None => {
                let exhausted = state.borrow().timers.exhausted();
                return Err(Error::challenge(if exhausted {
                    "timer limit reached before capture"
                } else {
                    "script went idle without settling"
                }));
            }
        }
    }
}

fn settle(outcome: Outcome) -> Result<String> {
    match outcome {
        Outcome::Resolved(value) if value.is_empty() => Err(Error::challenge(
            "script evaluation returned an empty string, expected non-empty JSON",
        )),
        Outcome::Resolved(value) => Ok(value),
        Outcome::Rejected(reason) => Err(Error::challenge(format!("JS promise rejected: {}", reason))),
        Outcome::NotAString(kind) => Err(Error::challenge(format!(
            "script evaluation did not return a string, got {}",
            kind
        ))),
    }
}

fn eval(context: &mut Context, code: &str, what: &str) -> Result<()> {
    context
        .eval(Source::from_bytes(code))
        .map(|_| ())
        .map_err(|e| Error::challenge(format!("failed to {}: {}", what, e)))
}

fn register_string(context: &mut Context, name: &str, value: &str) -> Result<()> {
    context
        .register_global_property(JsString::from(name), JsString::from(value), Attribute::all())
        .map_err(|e| Error::challenge(format!("failed to register {}: {}", name, e)))
}

fn register_native(context: &mut Context, name: &str, function: NativeFunction) -> Result<()> {
    let function = function.to_js_function(context.realm());
    context
        .register_global_property(JsString::from(name), function, Attribute::all())
        .map_err(|e| Error::challenge(format!("failed to register {}: {}", name, e)))
}

fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or_else(JsValue::undefined)
}

fn arg_string(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<String> {
    Ok(arg(args, index).to_string(context)?.to_std_string_escaped())
}

fn arg_millis(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<u64> {
    let n = arg(args, index).to_number(context)?;
    Ok(if n.is_finite() && n > 0.0 { n as u64 } else { 0 })
}

/// Install the `__host*` natives the prelude and wrapper call into
fn install_natives(context: &mut Context, state: &SharedState) -> Result<()> {
    let settle_fn = NativeFunction::from_copy_closure_with_captures(
        |_, args, state: &SharedState, ctx| {
            let kind = arg(args, 0).to_number(ctx)? as i32;
            let text = arg_string(args, 1, ctx)?;
            let mut state = state.borrow_mut();
            if state.outcome.is_none() {
                state.outcome = Some(match kind {
                    0 => Outcome::Resolved(text),
                    1 => Outcome::Rejected(text),
                    _ => Outcome::NotAString(text),
                });
            }
            Ok(JsValue::undefined())
        },
        state.clone(),
    );
    register_native(context, "__hostSettle", settle_fn)?;

    let schedule_fn = NativeFunction::from_copy_closure_with_captures(
        |_, args, state: &SharedState, ctx| {
            let delay = arg_millis(args, 0, ctx)?;
            let repeat = arg(args, 1).to_boolean();
            let mut state = state.borrow_mut();
            let id = if repeat {
                state.timers.set_interval(delay)
            } else {
                state.timers.set_timeout(delay)
            };
            Ok(JsValue::from(id))
        },
        state.clone(),
    );
    register_native(context, "__hostSchedule", schedule_fn)?;

    let cancel_fn = NativeFunction::from_copy_closure_with_captures(
        |_, args, state: &SharedState, ctx| {
            let id = arg(args, 0).to_number(ctx)?;
            if id.is_finite() && id >= 0.0 {
                state.borrow_mut().timers.clear_timer(id as u32);
            }
            Ok(JsValue::undefined())
        },
        state.clone(),
    );
    register_native(context, "__hostCancel", cancel_fn)?;

    let now_fn = NativeFunction::from_copy_closure_with_captures(
        |_, _, state: &SharedState, _| Ok(JsValue::from(state.borrow().timers.now_ms() as f64)),
        state.clone(),
    );
    register_native(context, "__hostNow", now_fn)?;

    let log_fn = NativeFunction::from_copy_closure(|_, args, ctx| {
        let level = arg_string(args, 0, ctx)?;
        let message = arg_string(args, 1, ctx)?;
        match level.as_str() {
            "warn" | "error" => warn!(target: "helicon::js", console = %level, "{}", message),
            _ => debug!(target: "helicon::js", console = %level, "{}", message),
        }
        Ok(JsValue::undefined())
    });
    register_native(context, "__hostLog", log_fn)?;

    Ok(())
}

/// FIFO promise job queue; future jobs are never produced by our natives
#[derive(Default)]
struct HostJobQueue {
    jobs: RefCell<VecDeque<NativeJob>>,
}

impl JobQueue for HostJobQueue {
    fn enqueue_promise_job(&self, job: NativeJob, _context: &mut Context) {
        self.jobs.borrow_mut().push_back(job);
    }

    fn enqueue_future_job(&self, _future: FutureJob, _context: &mut Context) {
        warn!("dropping future job, the challenge host has no async natives");
    }

    fn run_jobs(&self, context: &mut Context) {
        loop {
            let job = self.jobs.borrow_mut().pop_front();
            let Some(job) = job else { break };
            if let Err(e) = job.call(context) {
                debug!(error = %e, "promise job failed");
            }
        }
    }
}
