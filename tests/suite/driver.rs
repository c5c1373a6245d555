//! Launch behavior through the public driver API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use moss_driver::{
    Advance, Computation, DriveError, Input, Outcome, PendingOperation, Progress, Suspension,
    deferred, drive, drive_to_outcome, launch, launch_with,
};

type Log = Arc<Mutex<Vec<String>>>;

fn note(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

/// Reads a value with a fallback when the read fails.
struct ReadWithFallback {
    log: Log,
    fail: bool,
}

impl Computation for ReadWithFallback {
    type Value = String;
    type Output = String;
    type Error = String;

    fn start(&mut self) -> Advance<Self> {
        let result = if self.fail {
            Err("offline".to_string())
        } else {
            Ok("fresh".to_string())
        };
        Ok(Progress::wait(PendingOperation::ready(result)))
    }

    fn resume(&mut self, value: String) -> Advance<Self> {
        Ok(Progress::Finished(value))
    }

    fn resume_with_failure(&mut self, error: String) -> Advance<Self> {
        note(&self.log, format!("recovered from {error}"));
        Ok(Progress::Finished("cached".to_string()))
    }
}

#[tokio::test]
async fn recovery_substitutes_fallback() {
    let log = Log::default();
    let computation = ReadWithFallback {
        log: Arc::clone(&log),
        fail: true,
    };

    let value = launch(move || Ok(computation)).await.unwrap();

    assert_eq!(value, "cached");
    assert_eq!(*log.lock().unwrap(), ["recovered from offline"]);
}

#[tokio::test]
async fn successful_read_skips_recovery() {
    let log = Log::default();
    let computation = ReadWithFallback {
        log: Arc::clone(&log),
        fail: false,
    };

    assert_eq!(launch(move || Ok(computation)).await.unwrap(), "fresh");
    assert!(log.lock().unwrap().is_empty());
}

/// Waits on externally settled operations, one at a time, and sums them.
struct Sum {
    pending: Vec<PendingOperation<u32, String>>,
    total: u32,
    log: Log,
}

impl Sum {
    fn next(&mut self) -> Advance<Self> {
        match self.pending.pop() {
            Some(op) => {
                note(&self.log, format!("requested {}", self.pending.len()));
                Ok(Progress::wait(op))
            }
            None => Ok(Progress::Finished(self.total)),
        }
    }
}

impl Computation for Sum {
    type Value = u32;
    type Output = u32;
    type Error = String;

    fn start(&mut self) -> Advance<Self> {
        self.next()
    }

    fn resume(&mut self, value: u32) -> Advance<Self> {
        note(&self.log, format!("received {value}"));
        self.total += value;
        self.next()
    }
}

#[tokio::test]
async fn operations_are_requested_one_at_a_time() {
    let log = Log::default();
    let (first, first_op) = deferred();
    let (second, second_op) = deferred();
    let computation = Sum {
        // Popped from the back: first_op is requested first.
        pending: vec![second_op, first_op],
        total: 0,
        log: Arc::clone(&log),
    };

    let result = launch(move || Ok(computation));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(*log.lock().unwrap(), ["requested 1"]);

    second.resolve(20);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        *log.lock().unwrap(),
        ["requested 1"],
        "second operation must not be awaited before the first settles"
    );

    first.resolve(1);
    assert_eq!(result.await.unwrap(), 21);
    assert_eq!(
        *log.lock().unwrap(),
        ["requested 1", "received 1", "requested 0", "received 20"]
    );
}

struct Literal;

impl Computation for Literal {
    type Value = u32;
    type Output = u32;
    type Error = String;

    fn start(&mut self) -> Advance<Self> {
        Ok(Progress::Pending(Suspension::Bare(7)))
    }

    fn resume(&mut self, value: u32) -> Advance<Self> {
        Ok(Progress::Finished(value))
    }
}

#[tokio::test]
async fn literal_value_is_a_contract_violation() {
    match launch(|| Ok(Literal)).await {
        Err(DriveError::ContractViolation(violation)) => assert_eq!(violation.step, 1),
        other => panic!("expected ContractViolation, got {other:?}"),
    }
}

struct Done<T>(Option<T>);

impl<T: Send + 'static> Computation for Done<T> {
    type Value = ();
    type Output = T;
    type Error = String;

    fn start(&mut self) -> Advance<Self> {
        self.0.take().map(Progress::Finished).ok_or_else(|| "reused".to_string())
    }

    fn resume(&mut self, (): ()) -> Advance<Self> {
        Err("never suspended".to_string())
    }
}

#[tokio::test]
async fn falsy_results_still_settle() {
    assert_eq!(launch(|| Ok(Done(Some(String::new())))).await.unwrap(), "");
    assert_eq!(launch(|| Ok(Done(Some(0_u8)))).await.unwrap(), 0);
    assert!(!launch(|| Ok(Done(Some(false)))).await.unwrap());
}

#[tokio::test]
async fn factory_argument_is_forwarded() {
    let result = launch_with(|word: &'static str| Ok(Done(Some(word.len()))), "four");
    assert_eq!(result.await.unwrap(), 4);
}

#[tokio::test]
async fn drive_reports_exactly_once() {
    let settlements = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&settlements);

    drive(Done(Some(1_u8)), Input::Start, move |outcome: Outcome<u8, String>| {
        assert!(outcome.is_resolved());
        *counter.lock().unwrap() += 1;
    })
    .await;

    assert_eq!(*settlements.lock().unwrap(), 1);
}

#[tokio::test]
async fn taking_over_mid_flight_with_a_failure() {
    let computation = ReadWithFallback {
        log: Log::default(),
        fail: false,
    };

    let outcome = drive_to_outcome(computation, Input::Failure("stale".to_string())).await;
    assert_eq!(outcome.into_result().unwrap(), "cached");
}
