use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    ComponentOptions, Config, Event, EventKind, LoadError, LoadState, LoaderError, LoaderFn,
    LoaderRef, Orchestrator, RuntimeError, Subscribe,
};

fn value<T: Any + Clone + Send + Sync>(v: T) -> LoaderRef {
    LoaderFn::arc(move |_ctx: CancellationToken| {
        let v = v.clone();
        async move { Ok::<_, LoaderError>(v) }
    })
}

/// Counts invocations and fails the first `failures` of them.
fn flaky(calls: &Arc<AtomicUsize>, failures: usize) -> LoaderRef {
    let calls = Arc::clone(calls);
    LoaderFn::arc(move |_ctx: CancellationToken| {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if n <= failures {
                Err(LoaderError::fail(format!("boom #{n}")))
            } else {
                Ok(n)
            }
        }
    })
}

fn always_failing(calls: &Arc<AtomicUsize>) -> LoaderRef {
    flaky(calls, usize::MAX)
}

/// Appends `start:<name>` / `end:<name>` around a sleep.
fn traced(log: &Arc<Mutex<Vec<String>>>, name: &'static str, ms: u64) -> LoaderRef {
    let log = Arc::clone(log);
    LoaderFn::arc(move |_ctx: CancellationToken| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(format!("start:{name}"));
            time::sleep(Duration::from_millis(ms)).await;
            log.lock().unwrap().push(format!("end:{name}"));
            Ok::<_, LoaderError>(())
        }
    })
}

fn position(log: &[String], entry: &str) -> usize {
    log.iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("missing {entry} in {log:?}"))
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn opts() -> ComponentOptions {
    ComponentOptions::new()
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_share_one_invocation() {
    let orch = Orchestrator::new(Config::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    orch.register(
        "db",
        LoaderFn::arc(move |_ctx: CancellationToken| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                time::sleep(Duration::from_millis(100)).await;
                Ok::<_, LoaderError>(String::from("pool"))
            }
        }),
        opts(),
    )
    .unwrap();

    let (a, b, c) = tokio::join!(
        orch.load_component("db"),
        orch.load_component("db"),
        orch.load_lazy("db"),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));
    assert_eq!(orch.export_loading_report().records.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn priority_groups_are_barriers() {
    let orch = Orchestrator::new(Config::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    orch.register("slow", traced(&log, "slow", 300), opts().priority(0))
        .unwrap();
    orch.register("fast", traced(&log, "fast", 10), opts().priority(0))
        .unwrap();
    orch.register("next", traced(&log, "next", 0), opts().priority(10))
        .unwrap();

    let report = orch.load_all().await.unwrap();
    assert_eq!(report.loaded, 3);

    let log = log.lock().unwrap().clone();
    assert!(position(&log, "start:next") > position(&log, "end:slow"));
    assert!(position(&log, "start:next") > position(&log, "end:fast"));
    // group members run concurrently
    assert!(position(&log, "start:fast") < position(&log, "end:slow"));
}

#[tokio::test(start_paused = true)]
async fn critical_root_completes_before_dependents_start() {
    let orch = Orchestrator::new(Config::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    orch.register("A", traced(&log, "A", 50), opts().priority(0).critical(true))
        .unwrap();
    orch.register("B", traced(&log, "B", 5), opts().priority(1).depends_on(["A"]))
        .unwrap();
    orch.register("C", traced(&log, "C", 5), opts().priority(1))
        .unwrap();

    let report = orch.load_all().await.unwrap();

    let log = log.lock().unwrap().clone();
    let a_done = position(&log, "end:A");
    assert!(position(&log, "start:B") > a_done);
    assert!(position(&log, "start:C") > a_done);
    assert_eq!((report.loaded, report.failed), (3, 0));
    assert_eq!(report.success_rate, 1.0);
}

#[tokio::test(start_paused = true)]
async fn cycle_is_rejected_without_running_loaders() {
    let orch = Orchestrator::new(Config::default());
    let calls = Arc::new(AtomicUsize::new(0));
    orch.register("a", flaky(&calls, 0), opts().depends_on(["b"]))
        .unwrap();
    orch.register("b", flaky(&calls, 0), opts().depends_on(["c"]))
        .unwrap();
    orch.register("c", flaky(&calls, 0), opts().depends_on(["a"]))
        .unwrap();
    orch.register("solo", value(1u8), opts()).unwrap();

    let report = orch.load_all().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!((report.loaded, report.failed), (1, 3));
    assert_eq!(report.attempts_of("a").count(), 1);

    let status = orch.module_status("a").unwrap();
    assert_eq!(status.state, LoadState::Failed);
    assert_eq!(
        status.last_error,
        Some(LoadError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "c".into(), "a".into()],
        })
    );
    assert!(matches!(
        orch.dependency_order("b"),
        Err(LoadError::CyclicDependency { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn critical_exhaustion_aborts_the_run() {
    let orch = Orchestrator::new(Config::default());
    let mut rx = orch.subscribe();
    let core_calls = Arc::new(AtomicUsize::new(0));
    let later_calls = Arc::new(AtomicUsize::new(0));
    orch.register("core", always_failing(&core_calls), opts().priority(0).critical(true))
        .unwrap();
    orch.register("later", flaky(&later_calls, 0), opts().priority(10))
        .unwrap();

    let started = Instant::now();
    let err = orch.load_all().await.unwrap_err();

    match err {
        RuntimeError::CriticalFailure { component, source } => {
            assert_eq!(component, "core");
            assert!(matches!(
                source,
                LoadError::RetryLimitExceeded { attempts: 3, ref last, .. } if last.contains("boom #3")
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(core_calls.load(Ordering::SeqCst), 3);
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    assert_eq!(orch.module_status("later").unwrap().state, LoadState::Registered);
    // 1s before attempt 2, 2s before attempt 3
    assert!(started.elapsed() >= Duration::from_secs(3));

    let events = drain(&mut rx);
    let delays: Vec<u32> = events
        .iter()
        .filter(|e| e.kind == EventKind::RetryScheduled)
        .filter_map(|e| e.delay_ms)
        .collect();
    assert_eq!(delays, vec![1000, 2000]);
    assert!(events.iter().any(|e| e.kind == EventKind::CriticalFailure));
    assert!(events.iter().any(|e| e.kind == EventKind::RunAborted));
    assert!(!events.iter().any(|e| e.kind == EventKind::LoadingComplete));
}

#[tokio::test(start_paused = true)]
async fn non_critical_failure_is_isolated() {
    let orch = Orchestrator::new(Config::default());
    let calls = Arc::new(AtomicUsize::new(0));
    for name in ["one", "two", "three", "four"] {
        orch.register(name, value(name), opts()).unwrap();
    }
    orch.register("broken", always_failing(&calls), opts().priority(0))
        .unwrap();

    let report = orch.load_all().await.unwrap();

    assert_eq!((report.loaded, report.failed), (4, 1));
    assert!((report.success_rate - 0.8).abs() < f64::EPSILON);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(
        orch.module_status("broken").unwrap().last_error,
        Some(LoadError::RetryLimitExceeded { attempts: 3, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn transient_failures_recover_within_budget() {
    let orch = Orchestrator::new(Config::default());
    let calls = Arc::new(AtomicUsize::new(0));
    orch.register("cache", flaky(&calls, 2), opts()).unwrap();

    let export = orch.load_component("cache").await.unwrap();

    assert_eq!(export.downcast_ref::<usize>(), Some(&3));
    let status = orch.module_status("cache").unwrap();
    assert_eq!(status.state, LoadState::Loaded);
    assert_eq!(status.attempts, 3);

    let stats = orch.advanced_statistics();
    assert_eq!(stats.total_attempts, 3);
    assert_eq!(stats.retries, 2);
    assert_eq!(stats.loaded, 1);
    assert_eq!(stats.errors_by_kind.get("loader_threw"), Some(&2));
}

#[tokio::test(start_paused = true)]
async fn loaded_component_is_not_reloaded() {
    let orch = Orchestrator::new(Config::default());
    let calls = Arc::new(AtomicUsize::new(0));
    orch.register("cfg", flaky(&calls, 0), opts()).unwrap();

    orch.load_all().await.unwrap();
    orch.load_component("cfg").await.unwrap();
    orch.load_all().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(orch.export_loading_report().records.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn terminal_failure_is_not_retried_on_later_requests() {
    let mut cfg = Config::default();
    cfg.retry_budget = 1;
    let orch = Orchestrator::new(cfg);
    let calls = Arc::new(AtomicUsize::new(0));
    orch.register("bad", always_failing(&calls), opts()).unwrap();

    let first = orch.load_component("bad").await.unwrap_err();
    let second = orch.load_component("bad").await.unwrap_err();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn lazy_components_wait_for_explicit_request() {
    let orch = Orchestrator::new(Config::default());
    let calls = Arc::new(AtomicUsize::new(0));
    orch.register("eager", value(()), opts()).unwrap();
    orch.register("search", flaky(&calls, 0), opts().lazy(true))
        .unwrap();

    let report = orch.load_all().await.unwrap();
    assert_eq!(report.attempts_of("search").count(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(orch.module_status("search").unwrap().state, LoadState::Registered);

    orch.load_lazy("search").await.unwrap();
    let report = orch.export_loading_report();
    let attempts: Vec<_> = report.attempts_of("search").collect();
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].is_success());
}

#[tokio::test(start_paused = true)]
async fn lazy_dependency_of_eager_component_loads_on_demand() {
    let orch = Orchestrator::new(Config::default());
    orch.register("lexicon", value(7u32), opts().lazy(true))
        .unwrap();
    orch.register("parser", value(()), opts().depends_on(["lexicon"]))
        .unwrap();

    let report = orch.load_all().await.unwrap();

    assert_eq!(report.loaded, 2);
    assert_eq!(orch.export::<u32>("lexicon").as_deref(), Some(&7));
}

#[tokio::test(start_paused = true)]
async fn failed_dependency_fails_dependents_without_retrying() {
    let orch = Orchestrator::new(Config::default());
    let db_calls = Arc::new(AtomicUsize::new(0));
    let api_calls = Arc::new(AtomicUsize::new(0));
    let web_calls = Arc::new(AtomicUsize::new(0));
    orch.register("db", always_failing(&db_calls), opts())
        .unwrap();
    orch.register("api", flaky(&api_calls, 0), opts().depends_on(["db"]))
        .unwrap();
    orch.register("web", flaky(&web_calls, 0), opts().depends_on(["api"]))
        .unwrap();

    let started = Instant::now();
    let report = orch.load_all().await.unwrap();

    // Only db's own retries spend time: 1s + 2s.
    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert_eq!((report.loaded, report.failed), (0, 3));
    assert_eq!(db_calls.load(Ordering::SeqCst), 3);
    assert_eq!(api_calls.load(Ordering::SeqCst), 0);
    assert_eq!(web_calls.load(Ordering::SeqCst), 0);

    for (name, dep) in [("api", "db"), ("web", "api")] {
        let st = orch.module_status(name).unwrap();
        assert_eq!(st.state, LoadState::Failed);
        assert_eq!(st.attempts, 1, "{name}");
        assert!(matches!(
            st.last_error,
            Some(LoadError::DependencyFailed { ref dependency, .. }) if dependency == dep
        ));
    }
    assert_eq!(report.attempts_of("api").count(), 1);
}

#[tokio::test(start_paused = true)]
async fn last_duration_only_counts_successful_attempts() {
    let orch = Orchestrator::new(Config::default());
    orch.register(
        "slow",
        LoaderFn::arc(|_ctx: CancellationToken| async {
            time::sleep(Duration::from_millis(50)).await;
            Err::<(), _>(LoaderError::fail("still down"))
        }),
        opts(),
    )
    .unwrap();

    orch.load_all().await.unwrap();

    let st = orch.module_status("slow").unwrap();
    assert_eq!(st.state, LoadState::Failed);
    assert_eq!(st.attempts, 3);
    assert_eq!(st.last_duration, None);
}

#[tokio::test(start_paused = true)]
async fn unknown_names_are_reported() {
    let orch = Orchestrator::new(Config::default());
    let mut rx = orch.subscribe();
    orch.register("api", value(()), opts().depends_on(["ghost"]))
        .unwrap();

    assert_eq!(
        orch.load_component("nobody").await.unwrap_err(),
        LoadError::NotRegistered {
            name: "nobody".into()
        }
    );
    assert!(orch.module_status("nobody").is_none());

    assert_eq!(
        orch.load_component("api").await.unwrap_err(),
        LoadError::NotRegistered {
            name: "ghost".into()
        }
    );
    assert_eq!(orch.module_status("api").unwrap().attempts, 1);

    let missing: Vec<String> = drain(&mut rx)
        .into_iter()
        .filter(|e| e.kind == EventKind::ModuleNotFound)
        .filter_map(|e| e.component.map(|c| c.to_string()))
        .collect();
    assert_eq!(missing, vec!["nobody".to_string(), "ghost".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn timeout_counts_as_loader_failure() {
    let orch = Orchestrator::new(Config::default());
    orch.register(
        "stuck",
        LoaderFn::arc(|_ctx: CancellationToken| async {
            time::sleep(Duration::from_secs(60)).await;
            Ok::<_, LoaderError>(())
        }),
        opts()
            .timeout(Duration::from_millis(100))
            .retry_budget(1),
    )
    .unwrap();

    let err = orch.load_component("stuck").await.unwrap_err();

    assert!(matches!(
        err,
        LoadError::RetryLimitExceeded { attempts: 1, ref last, .. } if last.contains("timed out after 100ms")
    ));
    let report = orch.export_loading_report();
    let took = report.records[0].duration;
    assert!(took >= Duration::from_millis(100) && took < Duration::from_secs(1), "{took:?}");
}

#[tokio::test(start_paused = true)]
async fn registry_is_sealed_once_loading_starts() {
    let orch = Orchestrator::new(Config::default());
    orch.register("a", value(()), opts()).unwrap();
    assert!(!orch.is_sealed());

    orch.load_all().await.unwrap();

    assert!(orch.is_sealed());
    assert!(matches!(
        orch.register("b", value(()), opts()),
        Err(RuntimeError::RegistrySealed { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn profiles_layer_between_defaults_and_call_options() {
    let orch = Orchestrator::builder(Config::default())
        .with_profile("chat", opts().priority(5).critical(true).retry_budget(5))
        .build();
    orch.register("chat", value(()), opts().priority(9)).unwrap();
    orch.register("plain", value(()), opts()).unwrap();

    let components = orch.configured_components();
    let chat = components.iter().find(|d| d.name() == "chat").unwrap();
    assert_eq!(chat.priority(), 9);
    assert!(chat.is_critical());
    assert_eq!(chat.retry_budget(), Some(5));

    let plain = components.iter().find(|d| d.name() == "plain").unwrap();
    assert_eq!(plain.priority(), crate::DEFAULT_PRIORITY);
    assert!(!plain.is_critical());
}

#[tokio::test(start_paused = true)]
async fn typed_export_checks_the_type() {
    let orch = Orchestrator::new(Config::default());
    orch.register("answer", value(42u32), opts()).unwrap();
    assert!(orch.export::<u32>("answer").is_none());

    orch.load_all().await.unwrap();

    assert_eq!(orch.export::<u32>("answer").as_deref(), Some(&42));
    assert!(orch.export::<String>("answer").is_none());
}

#[tokio::test(start_paused = true)]
async fn concurrency_limit_does_not_block_dependency_waits() {
    let mut cfg = Config::default();
    cfg.max_concurrent = 1;
    let orch = Orchestrator::new(cfg);

    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let gauge = |running: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>| -> LoaderRef {
        let (running, peak) = (Arc::clone(running), Arc::clone(peak));
        LoaderFn::arc(move |_ctx: CancellationToken| {
            let (running, peak) = (Arc::clone(&running), Arc::clone(&peak));
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, LoaderError>(())
            }
        })
    };

    orch.register("base", gauge(&running, &peak), opts()).unwrap();
    orch.register("mid", gauge(&running, &peak), opts().depends_on(["base"]))
        .unwrap();
    orch.register("top", gauge(&running, &peak), opts().depends_on(["mid"]))
        .unwrap();
    orch.register("side", gauge(&running, &peak), opts()).unwrap();

    let report = orch.load_all().await.unwrap();

    assert_eq!(report.loaded, 4);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[derive(Default)]
struct Collector(Mutex<Vec<EventKind>>);

#[async_trait]
impl Subscribe for Collector {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_the_whole_run_after_shutdown() {
    let collector = Arc::new(Collector::default());
    let orch = Orchestrator::builder(Config::default())
        .with_subscribers(vec![collector.clone() as Arc<dyn Subscribe>])
        .build();
    orch.register("a", value(()), opts().priority(0)).unwrap();
    orch.register("b", value(()), opts().priority(1)).unwrap();

    orch.load_all().await.unwrap();
    orch.shutdown().await;

    let kinds = collector.0.lock().unwrap().clone();
    assert_eq!(kinds.iter().filter(|k| **k == EventKind::GroupStarting).count(), 2);
    assert_eq!(kinds.iter().filter(|k| **k == EventKind::ModuleLoaded).count(), 2);
    assert_eq!(kinds.last(), Some(&EventKind::LoadingComplete));
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_running_loads() {
    let mut cfg = Config::default();
    cfg.timeout = Duration::ZERO;
    let orch = Orchestrator::new(cfg);
    let started = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&started);
    orch.register(
        "waiter",
        LoaderFn::arc(move |ctx: CancellationToken| {
            flag.store(true, Ordering::SeqCst);
            async move {
                ctx.cancelled().await;
                Err::<(), _>(LoaderError::Canceled)
            }
        }),
        opts(),
    )
    .unwrap();

    let pending = tokio::spawn({
        let orch = Arc::clone(&orch);
        async move { orch.load_component("waiter").await }
    });
    while !started.load(Ordering::SeqCst) {
        tokio::task::yield_now().await;
    }
    orch.shutdown().await;

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(
        err,
        LoadError::Cancelled {
            component: "waiter".into()
        }
    );
    assert!(matches!(
        orch.load_component("late").await,
        Err(LoadError::NotRegistered { .. })
    ));
}
