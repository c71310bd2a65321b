use cucumber::{given, then, when, World};
use event_log::{EventSink, Recorder};

#[derive(Debug, World)]
#[world(init = Self::new)]
struct EventLogWorld {
    recorder: Recorder,
    capacity: usize,
    rendered: usize,
    last_words: Option<String>,
    run_failed: bool,
}

impl EventLogWorld {
    fn new() -> Self {
        Self {
            recorder: Recorder::new(),
            capacity: event_log::DEFAULT_CAPACITY,
            rendered: 0,
            last_words: None,
            run_failed: false,
        }
    }
}

#[given(expr = "an event sink with capacity {int}")]
async fn given_sink_capacity(world: &mut EventLogWorld, capacity: usize) {
    world.capacity = capacity;
}

#[given(expr = "a run that fails after logging {string}")]
async fn given_failing_run(world: &mut EventLogWorld, message: String) {
    world.last_words = Some(message);
}

#[when(expr = "the pipeline emits {int} events and closes the log")]
async fn when_emit_events(world: &mut EventLogWorld, count: usize) {
    let (events, sink) = EventSink::start(world.capacity, world.recorder.clone());
    for i in 0..count {
        events.info(format!("event {}", i)).await;
    }
    drop(events);
    world.rendered = sink.finish().await;
}

#[when("the run finishes inside a sink scope")]
async fn when_run_in_scope(world: &mut EventLogWorld) {
    let last_words = world.last_words.clone().unwrap();
    let result: Result<(), String> = EventSink::scope(world.recorder.clone(), |events| async move {
        events.info("logging routine started").await;
        events.info(last_words).await;
        Err("fetch_file -> connection refused".to_string())
    })
    .await;
    world.run_failed = result.is_err();
}

#[then(expr = "the sink should have rendered {int} events in order")]
async fn then_rendered_in_order(world: &mut EventLogWorld, count: usize) {
    assert_eq!(world.rendered, count);
    let expected: Vec<String> = (0..count).map(|i| format!("event {}", i)).collect();
    assert_eq!(world.recorder.messages(), expected);
}

#[then(expr = "the rendered events should end with {string}")]
async fn then_ends_with(world: &mut EventLogWorld, message: String) {
    assert_eq!(world.recorder.messages().last(), Some(&message));
}

#[then("the run result should be an error")]
async fn then_run_failed(world: &mut EventLogWorld) {
    assert!(world.run_failed);
}

#[tokio::main]
async fn main() {
    EventLogWorld::cucumber().run_and_exit("tests/features").await;
}
