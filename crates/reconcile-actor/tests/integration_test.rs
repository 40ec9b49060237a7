use reconcile_actor::{ActorEntity, BusyPolicy, FrameworkError, Lane, ResourceActor, Step};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::oneshot;

// --- Test Entity ---

/// Named registers whose writes are confirmed or refused by a "server" the test controls.
#[derive(Default)]
struct Registers {
    values: BTreeMap<String, i64>,
}

#[derive(Debug)]
enum RegisterCommand {
    Write {
        key: String,
        value: i64,
        when_busy: BusyPolicy,
        verdict: oneshot::Receiver<bool>,
    },
    /// A write whose server call blows up instead of answering.
    Crash { key: String },
}

struct Verdict {
    key: String,
    previous: Option<i64>,
    value: i64,
    accepted: bool,
}

#[derive(Debug, thiserror::Error)]
enum RegisterError {
    #[error("write refused for {0}")]
    Refused(String),
    #[error(transparent)]
    Framework(#[from] FrameworkError),
}

impl ActorEntity for Registers {
    type Key = String;
    type Command = RegisterCommand;
    type Reply = Verdict;
    type Output = i64;
    type Error = RegisterError;
    type Context = ();
    type Snapshot = BTreeMap<String, i64>;

    fn lane(command: &RegisterCommand) -> Lane<String> {
        match command {
            RegisterCommand::Write { key, when_busy, .. } => Lane::Keyed {
                key: key.clone(),
                when_busy: *when_busy,
            },
            RegisterCommand::Crash { key } => Lane::Keyed {
                key: key.clone(),
                when_busy: BusyPolicy::Queue,
            },
        }
    }

    fn begin(&mut self, command: RegisterCommand, _ctx: &()) -> Step<Self> {
        let (key, value, verdict) = match command {
            RegisterCommand::Write {
                key,
                value,
                verdict,
                ..
            } => (key, value, verdict),
            RegisterCommand::Crash { key } => {
                return Step::remote(async move { panic!("server call for {key} blew up") })
            }
        };
        let previous = self.values.insert(key.clone(), value);
        Step::remote(async move {
            let accepted = verdict.await.unwrap_or(false);
            Verdict {
                key,
                previous,
                value,
                accepted,
            }
        })
    }

    fn resume(&mut self, reply: Verdict, _ctx: &()) -> Step<Self> {
        if reply.accepted {
            return Step::ok(reply.value);
        }
        match reply.previous {
            Some(previous) => self.values.insert(reply.key.clone(), previous),
            None => self.values.remove(&reply.key),
        };
        Step::err(RegisterError::Refused(reply.key))
    }

    fn snapshot(&self) -> BTreeMap<String, i64> {
        self.values.clone()
    }
}

fn write(
    key: &str,
    value: i64,
    when_busy: BusyPolicy,
) -> (RegisterCommand, oneshot::Sender<bool>) {
    let (decide, verdict) = oneshot::channel();
    let command = RegisterCommand::Write {
        key: key.to_string(),
        value,
        when_busy,
        verdict,
    };
    (command, decide)
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

// --- Tests ---

#[tokio::test]
async fn test_optimistic_value_visible_then_rolled_back() {
    let (actor, client) = ResourceActor::new(10, Registers::default());
    tokio::spawn(actor.run(()));

    let (command, decide) = write("a", 7, BusyPolicy::Queue);
    let pending = tokio::spawn({
        let client = client.clone();
        async move { client.send(command).await }
    });
    settle().await;

    // In flight: the optimistic write is already published.
    assert_eq!(client.snapshot().get("a"), Some(&7));

    decide.send(false).unwrap();
    let result = pending.await.unwrap();
    assert!(matches!(result, Err(RegisterError::Refused(key)) if key == "a"));
    assert!(client.snapshot().get("a").is_none());
}

#[tokio::test]
async fn test_same_lane_is_queued_in_order() {
    let (actor, client) = ResourceActor::new(10, Registers::default());
    tokio::spawn(actor.run(()));

    let (first, decide_first) = write("a", 1, BusyPolicy::Queue);
    let (second, decide_second) = write("a", 2, BusyPolicy::Queue);

    let first_task = tokio::spawn({
        let client = client.clone();
        async move { client.send(first).await }
    });
    settle().await;
    let second_task = tokio::spawn({
        let client = client.clone();
        async move { client.send(second).await }
    });
    settle().await;

    // The second write has not been applied while the first is in flight.
    assert_eq!(client.snapshot().get("a"), Some(&1));

    decide_second.send(true).unwrap();
    decide_first.send(true).unwrap();

    assert_eq!(first_task.await.unwrap().unwrap(), 1);
    assert_eq!(second_task.await.unwrap().unwrap(), 2);
    assert_eq!(client.snapshot().get("a"), Some(&2));
}

#[tokio::test]
async fn test_reject_policy_refuses_second_command() {
    let (actor, client) = ResourceActor::new(10, Registers::default());
    tokio::spawn(actor.run(()));

    let (first, decide_first) = write("a", 1, BusyPolicy::Reject);
    let (second, _decide_second) = write("a", 2, BusyPolicy::Reject);

    let first_task = tokio::spawn({
        let client = client.clone();
        async move { client.send(first).await }
    });
    settle().await;

    let rejected = client.send(second).await;
    assert!(matches!(
        rejected,
        Err(RegisterError::Framework(FrameworkError::LaneBusy(key))) if key == "a"
    ));

    decide_first.send(true).unwrap();
    assert_eq!(first_task.await.unwrap().unwrap(), 1);
}

#[tokio::test]
async fn test_different_lanes_do_not_wait_for_each_other() {
    let (actor, client) = ResourceActor::new(10, Registers::default());
    tokio::spawn(actor.run(()));

    let (slow, decide_slow) = write("slow", 1, BusyPolicy::Queue);
    let (fast, decide_fast) = write("fast", 2, BusyPolicy::Queue);

    let slow_task = tokio::spawn({
        let client = client.clone();
        async move { client.send(slow).await }
    });
    settle().await;

    decide_fast.send(true).unwrap();
    assert_eq!(client.send(fast).await.unwrap(), 2);
    assert!(!slow_task.is_finished());

    decide_slow.send(true).unwrap();
    assert_eq!(slow_task.await.unwrap().unwrap(), 1);
}

#[tokio::test]
async fn test_actor_stops_after_clients_dropped_and_calls_finish() {
    let (actor, client) = ResourceActor::new(10, Registers::default());
    let handle = tokio::spawn(actor.run(()));

    let (command, decide) = write("a", 1, BusyPolicy::Queue);
    let pending = tokio::spawn(async move { client.send(command).await });
    settle().await;

    assert!(!handle.is_finished());
    decide.send(true).unwrap();
    assert_eq!(pending.await.unwrap().unwrap(), 1);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_panicking_call_frees_its_lane() {
    let (actor, client) = ResourceActor::new(10, Registers::default());
    tokio::spawn(actor.run(()));

    let crashed = client
        .send(RegisterCommand::Crash { key: "a".into() })
        .await;
    assert!(matches!(
        crashed,
        Err(RegisterError::Framework(FrameworkError::ActorDropped))
    ));

    // The next write on the same key is not stuck behind the dead call.
    let (command, decide) = write("a", 5, BusyPolicy::Queue);
    decide.send(true).unwrap();
    let written = tokio::time::timeout(Duration::from_secs(1), client.send(command))
        .await
        .expect("lane stayed busy after a panicking call");
    assert_eq!(written.unwrap(), 5);
}

#[tokio::test]
async fn test_panicking_call_hands_lane_to_queued_command() {
    let (actor, client) = ResourceActor::new(10, Registers::default());
    tokio::spawn(actor.run(()));

    let (hold, decide_hold) = write("a", 1, BusyPolicy::Queue);
    let held = tokio::spawn({
        let client = client.clone();
        async move { client.send(hold).await }
    });
    settle().await;

    // Queued behind the held write, then crashes.
    let crashed = tokio::spawn({
        let client = client.clone();
        async move { client.send(RegisterCommand::Crash { key: "a".into() }).await }
    });
    settle().await;
    let (after, decide_after) = write("a", 3, BusyPolicy::Queue);
    decide_after.send(true).unwrap();
    let waiting = tokio::spawn({
        let client = client.clone();
        async move { client.send(after).await }
    });
    settle().await;

    decide_hold.send(true).unwrap();
    assert_eq!(held.await.unwrap().unwrap(), 1);
    assert!(crashed.await.unwrap().is_err());
    let written = tokio::time::timeout(Duration::from_secs(1), waiting)
        .await
        .expect("queued write never started");
    assert_eq!(written.unwrap().unwrap(), 3);
}
