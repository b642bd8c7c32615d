#![cfg(unix)]

use std::path::Path;

use ysync_schedule::{Launchctl, ScheduleError, ServiceManager};

#[test]
fn successful_command_is_ok() {
    let manager = Launchctl::new("true");
    manager
        .load(Path::new("/tmp/com.ysync.test.plist"))
        .expect("load");
    manager
        .unload(Path::new("/tmp/com.ysync.test.plist"))
        .expect("unload");
}

#[test]
fn failing_command_carries_exit_code() {
    let manager = Launchctl::new("false");
    let err = manager
        .load(Path::new("/tmp/com.ysync.test.plist"))
        .unwrap_err();

    assert_eq!(err.exit_code(), Some(1));
    match &err {
        ScheduleError::Launchctl { action, .. } => assert_eq!(*action, "load"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("false load failed (exit code 1)"));
}

#[test]
fn missing_program_is_an_io_error() {
    let manager = Launchctl::new("ysync-no-such-launchctl");
    let err = manager
        .unload(Path::new("/tmp/com.ysync.test.plist"))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Io { .. }), "got: {err}");
}
