use page_voice::error::JobError;
use page_voice::worker::JobRunner;
use std::sync::mpsc;
use std::time::Duration;

#[test]
fn result_is_delivered_once() {
    let runner = JobRunner::new();
    let handle = runner.submit("sum", || (1..=10).sum::<u32>()).unwrap();
    assert_eq!(handle.wait().unwrap(), 55);
}

#[test]
fn second_submission_is_rejected_while_busy() {
    let runner = JobRunner::new();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let handle = runner
        .submit("hold", move || {
            release_rx.recv().ok();
            "done"
        })
        .unwrap();

    assert!(runner.is_busy());
    assert!(matches!(runner.submit("other", || ()), Err(JobError::Busy)));
    assert!(handle.try_wait().unwrap().is_none());

    release_tx.send(()).unwrap();
    assert_eq!(handle.wait().unwrap(), "done");

    assert!(!runner.is_busy());
    let again = runner.submit("again", || 7).unwrap();
    assert_eq!(again.wait().unwrap(), 7);
}

#[test]
fn panicking_unit_reports_worker_lost_and_frees_runner() {
    let runner = JobRunner::new();
    let handle = runner.submit("boom", || -> u8 { panic!("boom") }).unwrap();
    assert!(matches!(handle.wait(), Err(JobError::WorkerLost)));

    // The flag is cleared during unwinding, just before the channel drops.
    let mut tries = 0;
    while runner.is_busy() && tries < 100 {
        std::thread::sleep(Duration::from_millis(10));
        tries += 1;
    }
    assert!(runner.submit("after", || ()).unwrap().wait().is_ok());
}

#[test]
fn clones_share_the_limit() {
    let runner = JobRunner::new();
    let twin = runner.clone();
    let (tx, rx) = mpsc::channel::<()>();
    let handle = runner
        .submit("hold", move || {
            rx.recv().ok();
        })
        .unwrap();
    assert!(matches!(twin.submit("other", || ()), Err(JobError::Busy)));
    tx.send(()).unwrap();
    handle.wait().unwrap();
}
