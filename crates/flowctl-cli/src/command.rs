//! Line parsing for the interactive session. Malformed input turns into a
//! [`UsageError`] whose display form is printed at the prompt; parse
//! problems never reach the engine.

use flowctl_core::{FlowId, TrafficClass};

/// One parsed command line. Each variant maps 1:1 to a controller
/// operation (or to a session action for `draw`/`help`/`exit`).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddNode { name: String },
    RemoveNode { name: String },
    AddLink { u: String, v: String, weight: f64 },
    RemoveLink { u: String, v: String },
    InjectFlow { src: String, dst: String, class: TrafficClass, critical: bool },
    FailLink { u: String, v: String },
    RestoreLink { u: String, v: String },
    ShowRoutes { id: FlowId },
    Draw,
    Help,
    Exit,
}

/// A malformed line; the message is printed verbatim at the prompt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct UsageError(String);

impl UsageError {
    fn usage(text: &str) -> Self {
        Self(format!("usage: {text}"))
    }
}

impl Command {
    /// Parses one input line. `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Command>, UsageError> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = parts.collect();
        let cmd = match head {
            "add_node" => match args.as_slice() {
                [name] => Command::AddNode {
                    name: (*name).to_owned(),
                },
                _ => return Err(UsageError::usage("add_node <name>")),
            },
            "remove_node" => match args.as_slice() {
                [name] => Command::RemoveNode {
                    name: (*name).to_owned(),
                },
                _ => return Err(UsageError::usage("remove_node <name>")),
            },
            "add_link" => match args.as_slice() {
                [u, v, w] => {
                    let weight: f64 = w
                        .parse()
                        .map_err(|_| UsageError::usage("add_link <u> <v> <weight>"))?;
                    if weight <= 0.0 {
                        return Err(UsageError(
                            "add_link: weight must be a positive number".to_owned(),
                        ));
                    }
                    Command::AddLink {
                        u: (*u).to_owned(),
                        v: (*v).to_owned(),
                        weight,
                    }
                }
                _ => return Err(UsageError::usage("add_link <u> <v> <weight>")),
            },
            "remove_link" => match args.as_slice() {
                [u, v] => Command::RemoveLink {
                    u: (*u).to_owned(),
                    v: (*v).to_owned(),
                },
                _ => return Err(UsageError::usage("remove_link <u> <v>")),
            },
            "inject_flow" => match args.as_slice() {
                [src, dst, class] => Command::InjectFlow {
                    src: (*src).to_owned(),
                    dst: (*dst).to_owned(),
                    class: TrafficClass::from_name(class),
                    critical: false,
                },
                [src, dst, class, flag] if flag.eq_ignore_ascii_case("critical") => {
                    Command::InjectFlow {
                        src: (*src).to_owned(),
                        dst: (*dst).to_owned(),
                        class: TrafficClass::from_name(class),
                        critical: true,
                    }
                }
                _ => return Err(UsageError::usage("inject_flow <src> <dst> <class> [critical]")),
            },
            "fail_link" => match args.as_slice() {
                [u, v] => Command::FailLink {
                    u: (*u).to_owned(),
                    v: (*v).to_owned(),
                },
                _ => return Err(UsageError::usage("fail_link <u> <v>")),
            },
            "restore_link" => match args.as_slice() {
                [u, v] => Command::RestoreLink {
                    u: (*u).to_owned(),
                    v: (*v).to_owned(),
                },
                _ => return Err(UsageError::usage("restore_link <u> <v>")),
            },
            "show_routes" => match args.as_slice() {
                [id] => Command::ShowRoutes {
                    id: id
                        .parse()
                        .map_err(|_| UsageError::usage("show_routes <flow_id>"))?,
                },
                _ => return Err(UsageError::usage("show_routes <flow_id>")),
            },
            "draw" => match args.as_slice() {
                [] => Command::Draw,
                _ => return Err(UsageError::usage("draw")),
            },
            "help" | "?" => Command::Help,
            "exit" | "quit" => Command::Exit,
            unknown => {
                return Err(UsageError(format!(
                    "unknown command: {unknown} (try help)"
                )))
            }
        };
        Ok(Some(cmd))
    }
}
