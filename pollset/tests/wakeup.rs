#![cfg(unix)]

use pollset::backend::{INFINITE, Poll};
use pollset::wakeup::FdWakeup;
use pollset::{Config, Multiplex, PollFd, Ready, Signal};

use std::thread;
use std::time::{Duration, Instant};

fn pending<S: Signal>(wakeup: &S) -> bool {
    let mut fds = [wakeup.descriptor()];
    let ready = Poll::new(Config::default())
        .multiplex(&mut fds, 0)
        .expect("poll wakeup");

    ready == 1 && fds[0].revents().contains(Ready::READABLE)
}

fn signal_then_acknowledge<S: Signal>(wakeup: &S) {
    assert!(!pending(wakeup), "fresh wakeup must not be pending");

    wakeup.signal();
    assert!(pending(wakeup), "signalled wakeup must be readable");
    assert!(pending(wakeup), "readiness must persist until acknowledged");

    wakeup.acknowledge();
    assert!(!pending(wakeup), "acknowledge must clear the wakeup");
}

#[test]
fn fd_wakeup_signal_and_acknowledge() {
    let wakeup = FdWakeup::new().expect("create wakeup");
    signal_then_acknowledge(&wakeup);
}

#[test]
fn pipe_wakeup_signal_and_acknowledge() {
    let wakeup = FdWakeup::new_pipe().expect("create pipe wakeup");
    assert!(!wakeup.is_eventfd());

    signal_then_acknowledge(&wakeup);
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[test]
fn fd_wakeup_prefers_eventfd() {
    let wakeup = FdWakeup::new().expect("create wakeup");
    assert!(wakeup.is_eventfd());
}

#[test]
fn signals_coalesce_into_one_acknowledge() {
    for wakeup in [
        FdWakeup::new().expect("create wakeup"),
        FdWakeup::new_pipe().expect("create pipe wakeup"),
    ] {
        for _ in 0..5 {
            wakeup.signal();
        }
        assert!(pending(&wakeup));

        wakeup.acknowledge();
        assert!(!pending(&wakeup), "one acknowledge must clear five signals");
    }
}

#[test]
fn acknowledge_without_signal_is_noop() {
    let wakeup = FdWakeup::new().expect("create wakeup");

    wakeup.acknowledge();
    wakeup.acknowledge();

    assert!(!pending(&wakeup));
}

#[test]
fn signal_never_blocks_on_full_pipe() {
    let wakeup = FdWakeup::new_pipe().expect("create pipe wakeup");

    // Far beyond any pipe buffer.
    for _ in 0..200_000 {
        wakeup.signal();
    }
    assert!(pending(&wakeup));

    wakeup.acknowledge();
    assert!(!pending(&wakeup), "acknowledge must drain a full pipe");
}

#[test]
fn signal_from_other_thread_wakes_blocked_wait() {
    let wakeup = FdWakeup::new().expect("create wakeup");
    let poll = Poll::new(Config::default());

    let start = Instant::now();

    let ready = thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(50));
            wakeup.signal();
        });

        let mut fds = [wakeup.descriptor()];
        poll.multiplex(&mut fds, INFINITE).expect("wait for wakeup")
    });

    assert_eq!(ready, 1);
    assert!(
        start.elapsed() < Duration::from_secs(5),
        "wakeup did not end the wait"
    );

    wakeup.acknowledge();
}

#[test]
fn concurrent_signals_are_all_cleared() {
    let wakeup = FdWakeup::new().expect("create wakeup");

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..1000 {
                    wakeup.signal();
                }
            });
        }
    });

    assert!(pending(&wakeup));
    wakeup.acknowledge();
    assert!(!pending(&wakeup));
}

#[test]
fn descriptor_is_stable() {
    let wakeup = FdWakeup::new().expect("create wakeup");

    let a: PollFd<'_> = wakeup.descriptor();
    let b = wakeup.descriptor();

    assert_eq!(a.source().raw(), b.source().raw());
    assert_eq!(a.events(), Ready::READABLE);
}
