//! End-to-end integration tests for the calltrace CLI
//!
//! These tests run the real binary against `mock_gdb`, which replays a YAML
//! script of gdb commands and responses over a pipe. They cover:
//! 1. Prompt framing and session setup over a real child process
//! 2. Breakpoint registration through the command line
//! 3. The text and JSON reports, exit status and error block

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Test context with a scratch directory and the built binaries
struct TestContext {
    /// Temporary directory for this test, removed on drop
    temp_dir: tempfile::TempDir,
    /// Path to the calltrace binary
    calltrace_bin: PathBuf,
    /// Path to the mock gdb binary
    mock_gdb_bin: PathBuf,
}

/// Result of one CLI invocation
struct CliOutput {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("Failed to create temp dir"),
            calltrace_bin: PathBuf::from(env!("CARGO_BIN_EXE_calltrace")),
            mock_gdb_bin: PathBuf::from(env!("CARGO_BIN_EXE_mock_gdb")),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Write a mock gdb script and return its path
    fn write_script(&self, yaml: &str) -> PathBuf {
        let path = self.path("script.yaml");
        fs::write(&path, yaml).expect("Failed to write script");
        path
    }

    /// Run `calltrace` with the given arguments against a scripted mock gdb
    fn run(&self, script: &Path, args: &[&str]) -> CliOutput {
        let config_home = self.path("config");
        fs::create_dir_all(&config_home).expect("Failed to create config dir");

        let output = Command::new(&self.calltrace_bin)
            .args(args)
            .env("MOCK_GDB_SCRIPT", script)
            .env("XDG_CONFIG_HOME", &config_home)
            .env("RUST_LOG", "calltrace=debug")
            .output()
            .expect("Failed to run calltrace");

        CliOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    fn trace_args<'a>(&'a self, extra: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec![
            "trace",
            "--gdb",
            self.mock_gdb_bin.to_str().expect("utf-8 path"),
            "--timeout",
            "5",
        ];
        args.extend_from_slice(extra);
        args
    }
}

const RECURSION_SCRIPT: &str = r#"
banner: "GNU gdb (mock) 14.2\n"
steps:
  - expect: rbreak ^(foo|bar)$
    reply: |
      Breakpoint 1 at 0x1149: file t.c, line 3.
      int foo(int);
      Breakpoint 2 at 0x1161: file t.c, line 8.
      int bar(int);
  - expect: run
    reply: |
      Starting program: /tmp/a.out

      Breakpoint 1, foo (n=2) at t.c:3
      3	  if (n == 0) return 0;
  - expect: backtrace
    reply: |
      #0  foo (n=2) at t.c:3
      #1  0x00005555555551a0 in main () at t.c:14
  - expect: finish
    reply: |
      Run till exit from #0  foo (n=2) at t.c:3

      Breakpoint 2, bar (m=2) at t.c:8
      8	  return foo(m - 1) + 1;
  - expect: backtrace
    reply: |
      #0  bar (m=2) at t.c:8
      #1  0x0000555555555158 in foo (n=2) at t.c:4
      #2  0x00005555555551a0 in main () at t.c:14
  - expect: finish
    reply: |
      Run till exit from #0  bar (m=2) at t.c:8

      Breakpoint 1, foo (n=1) at t.c:3
      3	  if (n == 0) return 0;
  - expect: backtrace
    reply: |
      #0  foo (n=1) at t.c:3
      #1  0x0000555555555170 in bar (m=2) at t.c:8
      #2  0x0000555555555158 in foo (n=2) at t.c:4
      #3  0x00005555555551a0 in main () at t.c:14
  - expect: finish
    reply: |
      Run till exit from #0  foo (n=1) at t.c:3
      0x0000555555555170 in bar (m=2) at t.c:8
      Value returned is $1 = 1
  - expect: finish
    reply: |
      Run till exit from #0  bar (m=2) at t.c:8
      0x0000555555555158 in foo (n=2) at t.c:4
      Value returned is $2 = 2
  - expect: finish
    reply: |
      Run till exit from #0  foo (n=2) at t.c:3
      0x00005555555551a0 in main () at t.c:14
      Value returned is $3 = 3
  - expect: continue
    reply: |
      Continuing.
      [Inferior 1 (process 4242) exited normally]
"#;

#[test]
fn test_recursion_text_report() {
    let ctx = TestContext::new();
    let script = ctx.write_script(RECURSION_SCRIPT);
    let transcript = ctx.path("gdb.log");

    let args = ctx.trace_args(&[
        "-i",
        "^(foo|bar)$",
        "--transcript",
        transcript.to_str().unwrap(),
        "./a.out",
    ]);
    let output = ctx.run(&script, &args);

    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.starts_with("== Session: "));
    assert!(output.stdout.contains(
        "#1 foo (n=2) => 3\n  #2 bar (m=2) => 2\n    #3 foo (n=1) => 1\n"
    ));
    assert!(output
        .stdout
        .contains("== Exit: [Inferior 1 (process 4242) exited normally]"));
    assert!(output.stdout.contains("== Symbol breakpoints"));
    assert!(!output.stdout.contains("!! ERROR"));

    let log = fs::read_to_string(&transcript).expect("transcript written");
    assert!(log.contains(">>> set pagination off\n"));
    assert!(log.contains(">>> run\n"));
    assert!(log.contains("Value returned is $3 = 3"));
}

#[test]
fn test_recursion_json_report() {
    let ctx = TestContext::new();
    let script = ctx.write_script(RECURSION_SCRIPT);
    let report = ctx.path("trace.json");

    let args = ctx.trace_args(&[
        "-i",
        "^(foo|bar)$",
        "--format",
        "json",
        "-o",
        report.to_str().unwrap(),
        "./a.out",
    ]);
    let output = ctx.run(&script, &args);
    assert!(output.success, "stderr: {}", output.stderr);

    let text = fs::read_to_string(&report).expect("report written");
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
    assert_eq!(value["trace"]["roots"], serde_json::json!([1]));
    let nodes = value["trace"]["nodes"].as_array().expect("node list");
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0]["call_label"], "foo (n=2)");
    assert_eq!(nodes[0]["return_value"]["value"], "3");
    assert_eq!(nodes[2]["call_label"], "foo (n=1)");
    assert_eq!(nodes[2]["parent"], 2);
    assert_eq!(nodes[2]["level"], 2);
    assert_eq!(value["summary"]["symbols"][0]["breakpoint"], 1);
    assert_eq!(value["summary"]["symbols"][0]["hits"].as_array().unwrap().len(), 2);
    assert!(value.get("error").is_none());
}

#[test]
fn test_explicit_breakpoint_with_commands() {
    let ctx = TestContext::new();
    let script = ctx.write_script(
        r##"
steps:
  - expect: break loop.c:5
    reply: "Breakpoint 1 at 0x1151: file loop.c, line 5.\n"
  - expect: run
    reply: "Breakpoint 1, work (n=2) at loop.c:5\n5\t    sum += i;\n"
  - expect: backtrace
    reply: "#0  work (n=2) at loop.c:5\n#1  0x0000555555555190 in main () at loop.c:12\n"
  - expect: info locals
    reply: "i = 0\nsum = 0\n"
  - expect: p sum
    reply: "$1 = 0\n"
  - expect: finish
    reply: "Run till exit from #0  work (n=2) at loop.c:5\n\nBreakpoint 1, work (n=2) at loop.c:5\n5\t    sum += i;\n"
  - expect: backtrace
    reply: "#0  work (n=2) at loop.c:5\n#1  0x0000555555555190 in main () at loop.c:12\n"
  - expect: info locals
    reply: "i = 1\nsum = 0\n"
  - expect: p sum
    reply: "$2 = 0\n"
  - expect: finish
    reply: "Run till exit from #0  work (n=2) at loop.c:5\nmain () at loop.c:13\nValue returned is $3 = 1\n"
  - expect: continue
    reply: "[Inferior 1 (process 77) exited normally]\n"
"##,
    );

    let args = ctx.trace_args(&["-b", "p sum@loop.c:5", "./a.out"]);
    let output = ctx.run(&script, &args);

    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("#1 work (n=2) => 1\n"));
    assert!(output.stdout.contains("  #2 work (n=2) => (duplicate)\n"));
    assert!(output.stdout.contains("  | p sum\n  |   $1 = 0\n"));
    assert!(output.stdout.contains("== Explicit breakpoints\n  bp 1    hits 2"));
}

#[test]
fn test_excluded_wildcard_match_is_disabled() {
    let ctx = TestContext::new();
    let script = ctx.write_script(
        r##"
steps:
  - expect: rbreak ^calc
    reply: |
      Breakpoint 1 at 0x1149: file c.c, line 2.
      int calc(int);
      Breakpoint 2 at 0x1160: file c.c, line 6.
      void calc_debug(int);
  - expect: disable 2
  - expect: run
    reply: "[Inferior 1 (process 5) exited with code 03]\n"
"##,
    );

    let args = ctx.trace_args(&["-i", "^calc", "-x", "_debug$", "./a.out"]);
    let output = ctx.run(&script, &args);

    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("calc_debug @ 0x1160: file c.c, line 6 (disabled)"));
    assert!(output.stdout.contains("== Exit: [Inferior 1 (process 5) exited with code 03]"));
}

#[test]
fn test_unrecognized_response_reports_partial_tree() {
    let ctx = TestContext::new();
    let script = ctx.write_script(
        r##"
steps:
  - expect: rbreak ^foo$
    reply: "Breakpoint 1 at 0x1149: file t.c, line 3.\nint foo(int);\n"
  - expect: run
    reply: "Breakpoint 1, foo (n=1) at t.c:3\n"
  - expect: backtrace
    reply: "#0  foo (n=1) at t.c:3\n#1  0x00005555555551a0 in main () at t.c:14\n"
  - expect: finish
    reply: "Cannot access memory at address 0x0\n"
"##,
    );

    let args = ctx.trace_args(&["-i", "^foo$", "./a.out"]);
    let output = ctx.run(&script, &args);

    assert!(!output.success);
    assert_eq!(output.code, Some(1));
    assert!(output.stdout.contains("#1 foo (n=1) => ?\n"));
    assert!(output.stdout.contains("!! ERROR [UNRECOGNIZED_RESPONSE]"));
    assert!(output.stdout.contains("!!   Cannot access memory at address 0x0"));
    assert!(output.stderr.contains("Unrecognized debugger response"));
}

#[test]
fn test_failed_breakpoint_exits_with_error() {
    let ctx = TestContext::new();
    let script = ctx.write_script(
        r##"
steps:
  - expect: break nosuch.c:1
    reply: "No source file named nosuch.c.\n"
"##,
    );

    let args = ctx.trace_args(&["-b", "nosuch.c:1", "./a.out"]);
    let output = ctx.run(&script, &args);

    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("Failed to set breakpoint at nosuch.c:1"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_wrong_prompt_times_out() {
    let ctx = TestContext::new();
    let script = ctx.write_script("prompt: \"(mock) \"\nbanner: \"GNU gdb (mock)\\n\"\n");

    let mut args = ctx.trace_args(&["./a.out"]);
    args[4] = "1";
    let output = ctx.run(&script, &args);

    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("No prompt from debugger within 1 seconds"));
    assert!(output.stderr.contains("GNU gdb (mock)"));
}

#[test]
fn test_check_breakpoints_prints_clauses() {
    let ctx = TestContext::new();
    let script = ctx.write_script("steps: []\n");

    let output = ctx.run(&script, &["check-breakpoints", r"p f(a\, b);bt@t.c:9,main"]);

    assert!(output.success, "stderr: {}", output.stderr);
    assert_eq!(
        output.stdout,
        "1: t.c:9\n     | p f(a, b)\n     | bt\n2: main\n"
    );
}

#[test]
fn test_check_breakpoints_rejects_unbalanced() {
    let ctx = TestContext::new();
    let script = ctx.write_script("steps: []\n");

    let output = ctx.run(&script, &["check-breakpoints", "p (x@t.c:9"]);

    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("Unbalanced parentheses"));
}

#[test]
fn test_stderr_notice_belongs_to_its_response() {
    let ctx = TestContext::new();
    let script = ctx.write_script(
        r##"
steps:
  - expect: rbreak ^main$
    reply: "Breakpoint 1 at 0x1129: file m.c, line 2.\nint main(void);\n"
  - expect: run
    reply: "Breakpoint 1, main () at m.c:2\n"
  - expect: backtrace
    reply: "#0  main () at m.c:2\n"
  - expect: finish
    stderr: "\"finish\" not meaningful in the outermost frame.\n"
  - expect: continue
    reply: "[Inferior 1 (process 31) exited normally]\n"
"##,
    );

    let args = ctx.trace_args(&["-i", "^main$", "./a.out"]);
    let output = ctx.run(&script, &args);

    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("#1 main () => ?\n"));
    assert!(output
        .stdout
        .contains("== Exit: [Inferior 1 (process 31) exited normally]"));
}
