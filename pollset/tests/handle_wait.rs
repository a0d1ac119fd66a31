#![cfg(windows)]

use pollset::backend::{BoundedWait, FanOut, HandleWait, INFINITE};
use pollset::wakeup::EventWakeup;
use pollset::{Builder, Config, ErrorKind, Multiplex, PollFd, Ready};

use std::thread;
use std::time::{Duration, Instant};

fn events(n: usize) -> Vec<EventWakeup> {
    (0..n)
        .map(|_| EventWakeup::new().expect("create event"))
        .collect()
}

#[test]
fn signalled_event_is_readable() {
    let wakeup = EventWakeup::new().expect("create event");
    let waiter = HandleWait::new(Config::default());

    let mut fds = [wakeup.descriptor()];
    assert_eq!(waiter.wait_group(&mut fds, 0).expect("wait"), 0);

    wakeup.signal();
    assert_eq!(waiter.wait_group(&mut fds, 0).expect("wait"), 1);
    assert_eq!(fds[0].revents(), Ready::READABLE);

    wakeup.acknowledge();
    assert_eq!(waiter.wait_group(&mut fds, 0).expect("wait"), 0);
}

#[test]
fn zero_timeout_pass_reports_every_signalled_handle() {
    let wakeups = events(5);
    wakeups[1].signal();
    wakeups[3].signal();

    let mut fds: Vec<_> = wakeups.iter().map(EventWakeup::descriptor).collect();
    let ready = HandleWait::new(Config::default())
        .wait_group(&mut fds, 100)
        .expect("wait");

    assert_eq!(ready, 2);
    assert!(fds[1].is_ready() && fds[3].is_ready());
}

#[test]
fn nothing_to_wait_for_forever_is_rejected() {
    let mut fds: [PollFd<'_>; 0] = [];

    let err = HandleWait::new(Config::default())
        .wait_group(&mut fds, INFINITE)
        .expect_err("infinite wait on nothing");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn empty_set_sleeps_for_the_timeout() {
    let mut fds: [PollFd<'_>; 0] = [];

    let start = Instant::now();
    assert_eq!(
        HandleWait::new(Config::default())
            .wait_group(&mut fds, 50)
            .expect("wait"),
        0
    );
    assert!(start.elapsed() >= Duration::from_millis(40));
}

#[test]
fn over_ceiling_group_is_rejected() {
    let wakeups = events(5);
    let waiter = HandleWait::new(Builder::new().ceiling(4).config());

    let mut fds: Vec<_> = wakeups.iter().map(EventWakeup::descriptor).collect();
    let err = waiter.wait_group(&mut fds, 0).expect_err("five handles, ceiling four");

    assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
}

#[test]
fn fan_out_beyond_native_limit() {
    let wakeups = events(100);
    let multiplexer = FanOut::new(HandleWait::new(Config::default()));

    let ready = thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(30));
            wakeups[77].signal();
        });

        let mut fds: Vec<_> = wakeups.iter().map(EventWakeup::descriptor).collect();
        let ready = multiplexer.multiplex(&mut fds, 5000).expect("multiplex");

        assert!(fds[77].is_ready());
        assert_eq!(fds.iter().filter(|fd| fd.is_ready()).count(), 1);
        ready
    });

    assert_eq!(ready, 1);
}

#[cfg(not(feature = "bare-metal"))]
#[test]
fn message_queue_entry_is_accepted() {
    let wakeup = EventWakeup::new().expect("create event");
    wakeup.signal();

    let mut fds = [PollFd::messages(), wakeup.descriptor()];
    let ready = Builder::new()
        .build()
        .multiplex(&mut fds, 0)
        .expect("multiplex");

    assert!(ready >= 1);
    assert!(fds[1].is_ready());
}

#[test]
fn second_message_queue_entry_is_rejected() {
    let wakeup = EventWakeup::new().expect("create event");
    wakeup.signal();

    let waiter = HandleWait::new(Config::default());

    let mut fds = [wakeup.descriptor(), PollFd::messages(), PollFd::messages()];
    assert_eq!(waiter.wait_group(&mut fds[..1], 0).expect("wait"), 1);
    assert!(fds[0].is_ready());

    let err = waiter
        .wait_group(&mut fds, 0)
        .expect_err("two message queue entries");

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(fds.iter().all(|fd| !fd.is_ready()));
}
