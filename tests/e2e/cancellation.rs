use crate::*;
use std::process::Stdio;
use std::time::{Duration, Instant};

/// Interrupting a walk kills the running rulefiles and reports every
/// cancelled target.
#[test]
fn sigint_kills_running_targets() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(
        ".",
        "#!/bin/sh
set -e
case \"$1:$2\" in
deps:all) printf 'slow1\\nslow2\\n' ;;
exec:slow1|exec:slow2) exec sleep 10 ;;
esac
",
    )?;

    let start = Instant::now();
    let mut cmd = walk_command(vec!["all"]);
    let child = cmd
        .current_dir(space.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Give both sleeps time to start, then interrupt the walk.
    std::thread::sleep(Duration::from_secs(1));
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGINT);
    }

    let out = child.wait_with_output()?;
    assert!(!out.status.success());
    // Well before the sleeps would have finished on their own.
    assert!(start.elapsed() < Duration::from_secs(8));
    assert_stderr_contains(&out, "signal: ");
    assert_stderr_contains(&out, "targets failed");
    Ok(())
}
