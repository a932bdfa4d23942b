use crate::*;

#[cfg(unix)]
#[test]
fn linear_chain() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("hello.c", "int main() {}\n")?;
    space.write_rulefile("out", COMPILE_RULE)?;

    let out = space.run_expect(&mut walk_command(vec!["out/all"]))?;

    assert_eq!(space.read("out/hello")?, b"int main() {}\n");
    // Built targets are announced; the static hello.c is not.
    assert_stdout_contains(&out, "out/hello");
    assert_stdout_not_contains(&out, "hello.c");
    Ok(())
}

#[cfg(unix)]
#[test]
fn default_target_is_all() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(
        ".",
        "#!/bin/sh
case \"$1:$2\" in
exec:all) touch built ;;
esac
",
    )?;

    space.run_expect(&mut walk_command(vec![]))?;
    assert!(space.exists("built"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn diamond_builds_shared_dependency_once() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(
        ".",
        "#!/bin/sh
set -e
case \"$1:$2\" in
deps:all) printf 'b\\nc\\n' ;;
deps:b|deps:c) echo a ;;
exec:a) echo a >> log ;;
esac
",
    )?;

    space.run_expect(&mut walk_command(vec!["all"]))?;
    assert_eq!(space.read("log")?, b"a\n");
    Ok(())
}

#[cfg(unix)]
#[test]
fn verbose_prefixes_target_output() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(
        ".",
        "#!/bin/sh
case \"$1:$2\" in
exec:all) echo building all the things ;;
esac
",
    )?;

    // Without -v the target's stdout is discarded.
    let out = space.run_expect(&mut walk_command(vec!["all"]))?;
    assert_stdout_not_contains(&out, "building all the things");

    let out = space.run_expect(&mut walk_command(vec!["-v", "all"]))?;
    assert_stdout_contains(&out, "all\tbuilding all the things");

    let out = space.run_expect(&mut walk_command(vec!["-v", "--noprefix", "all"]))?;
    assert_stdout_contains(&out, "building all the things");
    assert_stdout_not_contains(&out, "all\tbuilding");
    Ok(())
}

#[cfg(unix)]
#[test]
fn bounded_parallelism_still_completes() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write_rulefile(
        ".",
        "#!/bin/sh
set -e
case \"$1:$2\" in
deps:all) printf 'a\\nb\\nc\\n' ;;
exec:a|exec:b|exec:c) touch \"built-$2\" ;;
esac
",
    )?;

    space.run_expect(&mut walk_command(vec!["-j", "1", "all"]))?;
    for name in ["built-a", "built-b", "built-c"] {
        assert!(space.exists(name), "{name} missing");
    }
    Ok(())
}

#[test]
fn version_flag() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run_expect(&mut walk_command(vec!["--version"]))?;
    assert_stdout_contains(&out, "walk ");
    Ok(())
}
