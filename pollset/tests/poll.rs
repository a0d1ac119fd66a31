#![cfg(unix)]

use pollset::backend::{INFINITE, MissingHooks, Poll};
use pollset::wakeup::{FdWakeup, TokenWakeup};
use pollset::{Config, ErrorKind, Multiplex, PollFd, Ready, Source};

use std::io::{Read, Write};
use std::os::fd::AsRawFd;
#[cfg(target_os = "linux")]
use std::os::fd::{FromRawFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn poll() -> Poll {
    Poll::new(Config::default())
}

#[cfg(target_os = "linux")]
fn pipe() -> (OwnedFd, OwnedFd) {
    let mut fds = [0; 2];
    assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0, "pipe failed");

    unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
}

#[test]
fn readable_after_peer_writes() {
    let (mut a, b) = UnixStream::pair().expect("socket pair");

    let mut fds = [PollFd::new(b.as_raw_fd(), Ready::READABLE)];
    assert_eq!(poll().multiplex(&mut fds, 0).expect("poll"), 0);

    a.write_all(b"x").expect("write");

    let ready = poll().multiplex(&mut fds, 0).expect("poll");
    assert_eq!(ready, 1);
    assert_eq!(fds[0].revents(), Ready::READABLE);
}

#[test]
fn writable_immediately() {
    let (a, _b) = UnixStream::pair().expect("socket pair");

    let mut fds = [PollFd::new(a.as_raw_fd(), Ready::WRITABLE)];
    let ready = poll().multiplex(&mut fds, 0).expect("poll");

    assert_eq!(ready, 1);
    assert!(fds[0].revents().contains(Ready::WRITABLE));
    assert!(!fds[0].revents().contains(Ready::READABLE));
}

#[test]
fn timeout_waits_at_least_the_timeout() {
    let (_a, b) = UnixStream::pair().expect("socket pair");

    let start = Instant::now();
    let mut fds = [PollFd::new(b.as_raw_fd(), Ready::READABLE)];
    let ready = poll().multiplex(&mut fds, 50).expect("poll");

    assert_eq!(ready, 0);
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(!fds[0].is_ready());
}

#[cfg(target_os = "linux")]
#[test]
fn closed_writer_reports_hangup() {
    let (read, write) = pipe();
    drop(write);

    let mut fds = [PollFd::new(read.as_raw_fd(), Ready::READABLE)];
    let ready = poll().multiplex(&mut fds, 0).expect("poll");

    assert_eq!(ready, 1);
    assert!(fds[0].revents().contains(Ready::HANGUP));
}

#[cfg(target_os = "linux")]
#[test]
fn hangup_reported_without_being_requested() {
    let (read, write) = pipe();
    drop(read);

    // Writing end of a pipe whose reader is gone.
    let mut fds = [PollFd::new(write.as_raw_fd(), Ready::empty())];
    let ready = poll().multiplex(&mut fds, 0).expect("poll");

    assert_eq!(ready, 1);
    assert!(
        fds[0]
            .revents()
            .intersects(Ready::ERROR | Ready::HANGUP),
        "broken pipe must surface without interest: {:?}",
        fds[0].revents()
    );
}

#[test]
fn only_ready_entries_are_counted() {
    let (mut a, b) = UnixStream::pair().expect("socket pair");
    let (_c, d) = UnixStream::pair().expect("socket pair");

    a.write_all(b"x").expect("write");

    let mut fds = [
        PollFd::new(d.as_raw_fd(), Ready::READABLE).with_tag(10),
        PollFd::new(b.as_raw_fd(), Ready::READABLE).with_tag(20),
        PollFd::new(-1, Ready::READABLE).with_tag(30),
    ];
    let ready = poll().multiplex(&mut fds, 0).expect("poll");

    assert_eq!(ready, 1);
    assert!(!fds[0].is_ready());
    assert!(fds[1].is_ready());
    assert!(!fds[2].is_ready(), "negative descriptors are ignored");

    let tags: Vec<_> = fds.iter().map(PollFd::tag).collect();
    assert_eq!(tags, [10, 20, 30]);
}

#[test]
fn events_outside_interest_are_masked_on_construction() {
    let fd = PollFd::new(0, Ready::READABLE | Ready::HANGUP | Ready::ERROR);
    assert_eq!(fd.events(), Ready::READABLE);
}

#[test]
fn token_source_is_rejected() {
    let wakeup = TokenWakeup::new(Arc::new(MissingHooks));

    let mut fds = [wakeup.descriptor()];
    let err = poll()
        .multiplex(&mut fds, 0)
        .expect_err("poll cannot wait on a token");

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(matches!(fds[0].source(), Source::Token(_)));
}

#[test]
fn wakeup_ends_infinite_wait() {
    let (_a, b) = UnixStream::pair().expect("socket pair");
    let wakeup = FdWakeup::new().expect("create wakeup");

    let (ready, fds) = thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(30));
            wakeup.signal();
        });

        let mut fds = [
            PollFd::new(b.as_raw_fd(), Ready::READABLE),
            wakeup.descriptor(),
        ];
        let ready = poll().multiplex(&mut fds, INFINITE).expect("poll");
        (ready, fds)
    });

    assert_eq!(ready, 1);
    assert!(!fds[0].is_ready());
    assert!(fds[1].revents().contains(Ready::READABLE));
}

#[test]
fn data_can_be_read_after_readiness() {
    let (mut a, mut b) = UnixStream::pair().expect("socket pair");
    a.write_all(b"hello").expect("write");

    let mut fds = [PollFd::new(b.as_raw_fd(), Ready::READABLE)];
    assert_eq!(poll().multiplex(&mut fds, INFINITE).expect("poll"), 1);

    let mut buffer = [0u8; 5];
    b.read_exact(&mut buffer).expect("read");
    assert_eq!(&buffer, b"hello");

    assert_eq!(poll().multiplex(&mut fds, 0).expect("poll"), 0);
}

#[cfg(all(
    unix,
    not(any(target_os = "macos", target_os = "ios", target_os = "freebsd")),
    not(feature = "select"),
    not(feature = "bare-metal")
))]
#[test]
fn free_function_uses_poll() {
    let (mut a, b) = UnixStream::pair().expect("socket pair");
    a.write_all(b"x").expect("write");

    let mut fds = [PollFd::new(b.as_raw_fd(), Ready::READABLE)];
    assert_eq!(pollset::multiplex(&mut fds, 0).expect("multiplex"), 1);
}
