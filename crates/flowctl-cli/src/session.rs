//! The interactive controller session: a read-eval loop over the command
//! table, writing human-readable results. All engine failures are printed
//! and the loop keeps going; only `exit` or end of input ends it.

use std::io::{BufRead, Write};

use anyhow::Context;
use flowctl_core::{Controller, ControllerError, FlowRoutes, Path};

use crate::command::Command;

const INTRO: &str = "flowctl interactive session. Type help for commands.";

const HELP: &str = "commands:
  add_node <name>
  remove_node <name>
  add_link <u> <v> <weight>
  remove_link <u> <v>
  inject_flow <src> <dst> <class> [critical]
  fail_link <u> <v>
  restore_link <u> <v>
  show_routes <flow_id>
  draw
  exit";

pub struct Session {
    controller: Controller,
}

impl Session {
    pub fn new(controller: Controller) -> Self {
        Self { controller }
    }

    /// Runs until `exit` or end of input. Malformed lines print usage text
    /// and keep the session alive.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> anyhow::Result<()> {
        writeln!(out, "{INTRO}")?;
        let mut line = String::new();
        loop {
            write!(out, "sdn> ")?;
            out.flush()?;
            line.clear();
            let n = input.read_line(&mut line).context("failed to read input")?;
            if n == 0 {
                break; // EOF
            }
            match Command::parse(&line) {
                Ok(Some(Command::Exit)) => {
                    writeln!(out, "bye")?;
                    break;
                }
                Ok(Some(cmd)) => self.dispatch(cmd, out)?,
                Ok(None) => {}
                Err(usage) => writeln!(out, "{usage}")?,
            }
        }
        Ok(())
    }

    fn dispatch<W: Write>(&mut self, cmd: Command, out: &mut W) -> anyhow::Result<()> {
        match cmd {
            Command::AddNode { name } => {
                if self.controller.add_node(&name) {
                    writeln!(out, "node {name} added")?;
                } else {
                    writeln!(out, "node {name} already exists")?;
                }
            }
            Command::RemoveNode { name } => match self.controller.remove_node(&name) {
                Ok(()) => writeln!(out, "node {name} removed")?,
                Err(err) => writeln!(out, "error: {err}")?,
            },
            Command::AddLink { u, v, weight } => match self.controller.add_link(&u, &v, weight) {
                Ok(()) => writeln!(out, "link {u} <-> {v} (weight {weight}) added")?,
                Err(err) => writeln!(out, "error: {err}")?,
            },
            Command::RemoveLink { u, v } => match self.controller.remove_link(&u, &v) {
                Ok(_) => writeln!(out, "link {u} <-> {v} removed")?,
                Err(err) => writeln!(out, "error: {err}")?,
            },
            Command::InjectFlow {
                src,
                dst,
                class,
                critical,
            } => match self.controller.install_flow(&src, &dst, class, critical) {
                Ok(id) => {
                    let routes = self.controller.query_flow(id).expect("just installed");
                    writeln!(
                        out,
                        "flow {id} injected: primary={} backup={}",
                        fmt_path(routes.flow.primary.as_ref()),
                        fmt_path(routes.flow.backup.as_ref())
                    )?;
                }
                Err(ControllerError::NoPathFound { flow, .. }) => {
                    writeln!(out, "flow {flow} registered but dropped: no path from {src} to {dst}")?;
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            Command::FailLink { u, v } => match self.controller.handle_link_failure(&u, &v) {
                Ok(report) if report.affected.is_empty() => {
                    writeln!(out, "link {u} <-> {v} failed; no flows affected")?;
                }
                Ok(report) => {
                    writeln!(
                        out,
                        "link {u} <-> {v} failed; {} flow(s) reconfigured",
                        report.affected.len()
                    )?;
                    for (id, outcome) in &report.affected {
                        writeln!(out, "  flow {id}: {outcome}")?;
                    }
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            Command::RestoreLink { u, v } => match self.controller.restore_link(&u, &v) {
                Ok(()) => {
                    writeln!(out, "link {u} <-> {v} restored; flows keep their current paths")?;
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            Command::ShowRoutes { id } => match self.controller.query_flow(id) {
                Ok(routes) => print_routes(&routes, out)?,
                Err(err) => writeln!(out, "error: {err}")?,
            },
            Command::Draw => {
                let dot = flowctl_viz::render_dot(&self.controller.snapshot());
                out.write_all(dot.as_bytes())?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Exit => unreachable!("handled by the caller"),
        }
        Ok(())
    }
}

fn fmt_path(path: Option<&Path>) -> String {
    path.map_or_else(|| "none".to_owned(), Path::to_string)
}

fn print_routes<W: Write>(routes: &FlowRoutes, out: &mut W) -> anyhow::Result<()> {
    let flow = &routes.flow;
    writeln!(
        out,
        "flow {}: {} -> {} class={} critical={} status={}",
        flow.id, flow.src, flow.dst, flow.class, flow.critical, flow.status
    )?;
    writeln!(
        out,
        "  primary={} backup={}",
        fmt_path(flow.primary.as_ref()),
        fmt_path(flow.backup.as_ref())
    )?;
    if routes.tables.is_empty() {
        writeln!(out, "  no flow-table entries")?;
        return Ok(());
    }
    writeln!(out, "  flow tables:")?;
    for (switch, entries) in &routes.tables {
        writeln!(out, "    switch {switch}:")?;
        for entry in entries {
            writeln!(
                out,
                "      match={} action={} prio={}",
                entry.match_key, entry.action, entry.priority
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn run_script(script: &str) -> String {
        let mut out = Vec::new();
        let mut session = Session::new(Controller::with_seed(7));
        session
            .run(&mut Cursor::new(script), &mut out)
            .expect("session failed");
        String::from_utf8(out).expect("utf8 output")
    }

    #[test]
    fn inject_and_show_routes() {
        let out = run_script(
            "add_link A B 1\nadd_link B C 1\nadd_link A C 5\n\
             inject_flow A C voice critical\nshow_routes 1\nexit\n",
        );
        assert!(out.contains("flow 1 injected: primary=A -> B -> C backup=A -> C"));
        assert!(out.contains("prio=100"));
        assert!(out.contains("prio=95"));
        assert!(out.contains("status=installed"));
    }

    #[test]
    fn failure_promotes_the_backup() {
        let out = run_script(
            "add_link A B 1\nadd_link B C 1\nadd_link A C 5\n\
             inject_flow A C voice critical\nfail_link A B\nshow_routes 1\nexit\n",
        );
        assert!(out.contains("flow 1: backup promoted"));
        assert!(out.contains("primary=A -> C backup=none"));
    }

    #[test]
    fn usage_errors_do_not_end_the_session() {
        let out = run_script("add_node\nadd_node X\nexit\n");
        assert!(out.contains("usage: add_node <name>"));
        assert!(out.contains("node X added"));
        assert!(out.contains("bye"));
    }

    #[test]
    fn engine_errors_are_printed_not_raised() {
        let out = run_script("fail_link A B\nexit\n");
        assert!(out.contains("error: node A does not exist"));
    }

    #[test]
    fn unroutable_flows_report_their_id() {
        let out = run_script("add_node A\nadd_node Z\ninject_flow A Z voice\nexit\n");
        assert!(out.contains("flow 1 registered but dropped: no path from A to Z"));
    }

    #[test]
    fn draw_emits_dot_output() {
        let out = run_script("add_link A B 1\ndraw\nexit\n");
        assert!(out.contains("graph topology {"));
        assert!(out.contains("\"A\" -- \"B\""));
    }

    #[test]
    fn session_ends_at_eof() {
        let out = run_script("add_node A\n");
        assert!(out.contains("node A added"));
    }
}
