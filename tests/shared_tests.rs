mod common;

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use common::*;
use simon_line::Config;
use simon_line::shared::{
    shared_session_setup, take_shared_session, try_with_shared_session, with_shared_session,
};

simon_line::shared_session!(SESSION: SimController, SimClock);
simon_line::shared_session!(LEASED: SimController, SimClock);

const FOREGROUND: [&str; 3] = ["1 1", "2 1", "4 1 2 3 4"];
const IDLE_TIMER: [&str; 3] = ["3 0", "4 5 7 5 5", "2 0"];

#[test]
fn concurrent_callers_never_interleave() {
    let wire = SimWire::default();
    wire.lock().fallback = Some(ack());
    assert!(shared_session_setup(&SESSION, session(&wire, Config::default())).is_none());

    thread::scope(|scope| {
        for commands in [FOREGROUND, IDLE_TIMER] {
            let _ = scope.spawn(move || {
                for command in commands {
                    with_shared_session(&SESSION, |s| s.send(2, command))
                        .expect("session installed")
                        .expect("acknowledged");
                }
            });
        }
    });

    let raw = wire.raw_frames();
    assert_eq!(raw.len(), 6);
    for pair in raw.windows(2) {
        let end = pair[0].last().unwrap().0;
        let start = pair[1].first().unwrap().0;
        assert!(end < start, "frames overlap: {end} >= {start}");
    }

    let mut received: Vec<String> = wire
        .frames()
        .into_iter()
        .map(|frame| receive_waveform(frame, 2).unwrap())
        .collect();
    received.sort();
    let mut expected: Vec<&str> = FOREGROUND.iter().chain(&IDLE_TIMER).copied().collect();
    expected.sort();
    assert_eq!(received, expected);

    // each thread's commands keep their order
    for commands in [FOREGROUND, IDLE_TIMER] {
        let positions: Vec<usize> = commands
            .iter()
            .map(|c| {
                wire.frames()
                    .into_iter()
                    .position(|f| receive_waveform(f, 2).unwrap() == *c)
                    .unwrap()
            })
            .collect();
        assert!(positions.windows(2).all(|p| p[0] < p[1]));
    }

    let session = take_shared_session(&SESSION).unwrap();
    assert!(session.state().confirmed);
    assert!(with_shared_session(&SESSION, |s| s.state()).is_none());
}

#[test]
fn exchange_runs_outside_the_critical_section() {
    let wire = SimWire::default();
    wire.lock().fallback = Some(ack());
    assert!(shared_session_setup(&LEASED, session(&wire, Config::default())).is_none());

    let (entered_tx, entered_rx) = mpsc::channel();
    let (resume_tx, resume_rx) = mpsc::channel::<()>();
    thread::scope(|scope| {
        let holder = scope.spawn(move || {
            with_shared_session(&LEASED, |s| {
                entered_tx.send(()).unwrap();
                let timeout = Duration::from_secs(5);
                let resumed = resume_rx.recv_timeout(timeout).is_ok();
                let finished = resume_rx.recv_timeout(timeout).is_ok();
                s.send(2, "1 1").unwrap();
                resumed && finished
            })
        });

        entered_rx.recv().unwrap();
        // Another context can enter a critical section while the session is
        // leased out, but cannot get at the session itself.
        critical_section::with(|_| resume_tx.send(()).unwrap());
        assert!(try_with_shared_session(&LEASED, |s| s.state()).is_none());
        resume_tx.send(()).unwrap();
        assert_eq!(holder.join().unwrap(), Some(true));
    });

    // Returned once the closure finished.
    let state = try_with_shared_session(&LEASED, |s| s.state()).unwrap();
    assert!(state.confirmed);
    assert_eq!(wire.frames().len(), 1);
    assert!(take_shared_session(&LEASED).is_some());
    assert!(try_with_shared_session(&LEASED, |s| s.state()).is_none());
}

#[test]
fn session_is_returned_when_the_exchange_panics() {
    simon_line::shared_session!(UNWOUND: SimController, SimClock);
    let wire = SimWire::default();
    assert!(shared_session_setup(&UNWOUND, session(&wire, Config::default())).is_none());

    let outcome = std::panic::catch_unwind(|| {
        let _ = with_shared_session::<_, _, ()>(&UNWOUND, |_| panic!("exchange aborted"));
    });
    assert!(outcome.is_err());
    assert!(with_shared_session(&UNWOUND, |s| s.is_provisioned()).unwrap());
}
