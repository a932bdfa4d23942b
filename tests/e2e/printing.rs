use crate::*;

#[cfg(unix)]
#[test]
fn print_dot_renders_reduced_graph() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    // all depends on a both directly and through b; the direct edge is
    // removed by transitive reduction.
    space.write_rulefile(
        ".",
        "#!/bin/sh
set -e
case \"$1:$2\" in
deps:all) printf 'a\\nb\\n' ;;
deps:b) echo a ;;
esac
",
    )?;

    let out = space.run_expect(&mut walk_command(vec!["-p", "dot", "all"]))?;
    assert_stdout_contains(&out, "digraph {");
    assert_stdout_contains(&out, "\"(root)\" -> \"all\"");
    assert_stdout_contains(&out, "\"all\" -> \"b\"");
    assert_stdout_contains(&out, "\"b\" -> \"a\"");
    assert_stdout_not_contains(&out, "\"all\" -> \"a\"");
    // Print only; nothing ran.
    assert_stdout_not_contains(&out, "exec");
    Ok(())
}

#[cfg(unix)]
#[test]
fn print_plain_lists_direct_dependencies() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("hello.c", "")?;
    space.write_rulefile("out", COMPILE_RULE)?;

    let out = space.run_expect(&mut walk_command(vec!["-p", "plain", "out/all"]))?;
    assert_stdout_contains(&out, "out/all\n  out/hello");
    assert_stdout_contains(&out, "out/hello\n  hello.c");
    Ok(())
}

#[test]
fn unknown_print_format_is_an_error() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run_fail(&mut walk_command(vec!["-p", "nope"]))?;
    assert_stderr_contains(&out, "unknown -p");
    Ok(())
}
