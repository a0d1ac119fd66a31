//! Win32 wait primitives.
//!
//! Handles cross this module as `isize` so poll sets stay `Send`; they are
//! turned back into `HANDLE`s only at the call site.

use std::io;
use std::ptr;

use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
use windows_sys::Win32::System::Threading::{
    CreateEventW, GetCurrentProcess, ResetEvent, SetEvent, WaitForMultipleObjectsEx,
    WaitForSingleObjectEx,
};
use windows_sys::Win32::UI::WindowsAndMessaging::MsgWaitForMultipleObjectsEx;

pub(crate) const WAIT_OBJECT_0: u32 = 0x0000_0000;
pub(crate) const WAIT_IO_COMPLETION: u32 = 0x0000_00C0;
pub(crate) const WAIT_TIMEOUT: u32 = 0x0000_0102;
pub(crate) const WAIT_FAILED: u32 = 0xFFFF_FFFF;

/// Blocks without a deadline.
pub(crate) const INFINITE: u32 = 0xFFFF_FFFF;

const QS_ALLINPUT: u32 = 0x04FF;
const MWMO_ALERTABLE: u32 = 0x0002;

pub(crate) fn as_handle(raw: isize) -> HANDLE {
    raw as HANDLE
}

/// Creates an unnamed, manual-reset, non-signalled event.
pub(crate) fn sys_create_event() -> io::Result<isize> {
    let handle = unsafe { CreateEventW(ptr::null(), 1, 0, ptr::null()) };

    if handle.is_null() {
        Err(io::Error::last_os_error())
    } else {
        Ok(handle as isize)
    }
}

pub(crate) fn sys_set_event(event: isize) -> io::Result<()> {
    if unsafe { SetEvent(as_handle(event)) } == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

pub(crate) fn sys_reset_event(event: isize) {
    unsafe { ResetEvent(as_handle(event)) };
}

pub(crate) fn sys_close_handle(handle: isize) {
    unsafe { CloseHandle(as_handle(handle)) };
}

/// Alertable wait for any of `handles`.
pub(crate) fn sys_wait_any(handles: &[HANDLE], timeout_ms: u32) -> u32 {
    unsafe {
        WaitForMultipleObjectsEx(handles.len() as u32, handles.as_ptr(), 0, timeout_ms, 1)
    }
}

/// Alertable wait for any of `handles` or for input on the calling thread's
/// message queue. Message input is reported as `WAIT_OBJECT_0 + handles.len()`.
pub(crate) fn sys_wait_any_or_messages(handles: &[HANDLE], timeout_ms: u32) -> u32 {
    unsafe {
        MsgWaitForMultipleObjectsEx(
            handles.len() as u32,
            handles.as_ptr(),
            timeout_ms,
            QS_ALLINPUT,
            MWMO_ALERTABLE,
        )
    }
}

/// Alertable sleep. Waits on the current process, which only becomes
/// signalled once it exits.
pub(crate) fn sys_sleep(timeout_ms: u32) {
    unsafe { WaitForSingleObjectEx(GetCurrentProcess(), timeout_ms, 1) };
}
