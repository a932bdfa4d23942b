use crate::*;

#[cfg(unix)]
#[test]
fn cyclic_dependencies_abort_planning() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(
        ".",
        "#!/bin/sh
case \"$1:$2\" in
deps:a) echo b ;;
deps:b) echo a ;;
esac
",
    )?;

    let out = space.run_fail(&mut walk_command(vec!["a"]))?;
    assert_stderr_contains(&out, "Cycle: ");
    // Nothing was executed.
    assert!(!space.exists("built"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn exec_failure_is_reported_per_target() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(
        ".",
        "#!/bin/sh
case \"$1:$2\" in
exec:fail) exit 1 ;;
esac
",
    )?;

    let out = space.run_fail(&mut walk_command(vec!["fail"]))?;
    assert_stderr_contains(&out, "error performing fail");
    assert_stderr_contains(&out, "exit status 1");
    assert_stderr_contains(&out, "1 targets failed");
    Ok(())
}

#[cfg(unix)]
#[test]
fn missing_static_target_fails() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run_fail(&mut walk_command(vec!["missing"]))?;
    assert_stderr_contains(&out, "error performing missing");
    assert_stderr_contains(&out, "1 targets failed");
    Ok(())
}

#[cfg(unix)]
#[test]
fn failed_branch_does_not_stop_independent_work() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(
        ".",
        "#!/bin/sh
set -e
case \"$1:$2\" in
deps:all) printf 'good\\nbad\\n' ;;
exec:good) touch good-built ;;
exec:bad) exit 1 ;;
esac
",
    )?;

    let out = space.run_fail(&mut walk_command(vec!["all"]))?;
    assert!(space.exists("good-built"));
    assert_stderr_contains(&out, "error performing bad");
    assert_stderr_contains(&out, "1 targets failed");
    Ok(())
}

#[cfg(unix)]
#[test]
fn failed_dependency_skips_dependents() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(
        ".",
        "#!/bin/sh
set -e
case \"$1:$2\" in
deps:top) echo broken ;;
exec:broken) exit 1 ;;
exec:top) touch top-built ;;
esac
",
    )?;

    space.run_fail(&mut walk_command(vec!["top"]))?;
    assert!(!space.exists("top-built"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn deps_phase_failure_aborts_planning() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(".", "#!/bin/sh\nexit 3\n")?;

    let out = space.run_fail(&mut walk_command(vec!["all"]))?;
    assert_stderr_contains(&out, "error getting dependencies for all");
    assert_stderr_contains(&out, "exit status 3");
    Ok(())
}

#[cfg(unix)]
#[test]
fn empty_dependency_lines_are_ignored() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(
        ".",
        "#!/bin/sh
set -e
case \"$1:$2\" in
deps:all) printf 'a\\n\\nb\\n' ;;
exec:a|exec:b) touch \"built-$2\" ;;
esac
",
    )?;

    space.run_expect(&mut walk_command(vec!["all"]))?;
    assert!(space.exists("built-a"));
    assert!(space.exists("built-b"));
    Ok(())
}
