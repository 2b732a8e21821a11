mod debug_report;

use atomexpr::{Atom, AtomError, AtomProvider, EvalFlags, Expression, Options, ParsedAtom, parse_word};
use std::collections::HashMap;
use std::io::{self, IsTerminal, Read};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ATOMEXPR_LOG";

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(io::stderr).init();

    let options = Options { reorder: config.reorder, ..Options::default() };
    let expr = match Expression::parse_with(&config.input, config.atoms, &options) {
        Ok(expr) => expr,
        Err(err) => {
            debug_report::print_parse_error(&config.input, &err, config.color);
            std::process::exit(2);
        }
    };

    let run = expr.evaluate_verbose(&(), config.flags);
    debug_report::print_run(&expr, &run, config.flags, config.color);
}

/// Atoms whose values come from `--set`.
struct CliAtoms {
    values: HashMap<String, f64>,
    priorities: HashMap<String, i32>,
}

impl AtomProvider for CliAtoms {
    type Context = ();
    type Data = ();

    fn parse_atom<'a>(&self, input: &'a str) -> Result<ParsedAtom<'a>, AtomError> {
        parse_word(input)
    }

    fn process_atom(&self, atom: Atom<'_>, _context: &()) -> Result<f64, AtomError> {
        self.values.get(atom.text()).copied().ok_or_else(|| AtomError::new("no value given (use --set NAME=VALUE)"))
    }

    fn priority(&self, text: &str, _data: &()) -> i32 {
        self.priorities.get(text).copied().unwrap_or(0)
    }
}

struct CliConfig {
    input: String,
    atoms: CliAtoms,
    flags: EvalFlags,
    reorder: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut atoms = CliAtoms { values: HashMap::new(), priorities: HashMap::new() };
    let mut flags = EvalFlags::empty();
    let mut reorder = true;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("atomexpr {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--weighted" => flags |= EvalFlags::WEIGHTED,
            "--no-short-circuit" => flags |= EvalFlags::NO_SHORTCIRCUIT,
            "--no-reorder" => reorder = false,
            "--set" | "-s" => {
                let value = args.next().ok_or_else(|| "error: --set expects NAME=VALUE".to_string())?;
                let (name, value) = parse_assignment::<f64>("--set", &value)?;
                atoms.values.insert(name, value);
            }
            "--priority" | "-p" => {
                let value = args.next().ok_or_else(|| "error: --priority expects NAME=N".to_string())?;
                let (name, value) = parse_assignment::<i32>("--priority", &value)?;
                atoms.priorities.insert(name, value);
            }
            "--expr" | "-e" => {
                let value = args.next().ok_or_else(|| "error: --expr expects a value".to_string())?;
                set_input(&mut input, value)?;
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    set_input(&mut input, rest)?;
                }
                break;
            }
            _ if arg.starts_with("--set=") => {
                let (name, value) = parse_assignment::<f64>("--set", arg.trim_start_matches("--set="))?;
                atoms.values.insert(name, value);
            }
            _ if arg.starts_with("--priority=") => {
                let (name, value) = parse_assignment::<i32>("--priority", arg.trim_start_matches("--priority="))?;
                atoms.priorities.insert(name, value);
            }
            _ if arg.starts_with("--expr=") => {
                set_input(&mut input, arg.trim_start_matches("--expr=").to_string())?;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                set_input(&mut input, rest)?;
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no expression provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, atoms, flags, reorder, color })
}

fn set_input(input: &mut Option<String>, value: String) -> Result<(), String> {
    if input.is_some() {
        return Err("error: expression provided multiple times".to_string());
    }
    *input = Some(value);
    Ok(())
}

fn parse_assignment<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<(String, T), String> {
    let (name, value) =
        raw.split_once('=').ok_or_else(|| format!("error: {flag} expects NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("error: {flag} has an empty atom name in '{raw}'"));
    }
    let value = value.trim().parse::<T>().map_err(|_| format!("error: {flag} has an invalid value in '{raw}'"))?;
    Ok((name.to_string(), value))
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "atomexpr {version}

Rule expression debugger: parses an expression, evaluates it against atom
values given on the command line and prints the canonical form, atoms, trace
and metrics.

Usage:
  atomexpr [OPTIONS] [--] <expression...>
  atomexpr [OPTIONS] --expr <text>

Options:
  -e, --expr <text>          Expression to evaluate. If omitted, reads remaining
                             args or stdin when no args are provided.
  -s, --set <NAME=VALUE>     Value of an atom. Atoms without a value fail and
                             count as 0.
  -p, --priority <NAME=N>    Priority of an atom (lower runs earlier).
  --weighted                 Combine magnitudes instead of booleans.
  --no-short-circuit         Evaluate every atom.
  --no-reorder               Keep textual evaluation order.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}               Log filter (tracing EnvFilter syntax). Default: warn

Exit codes:
  0  Success.
  2  Invalid arguments, missing input or unparsable expression.
",
        version = env!("CARGO_PKG_VERSION"),
        log_env = LOG_ENV,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments() {
        assert_eq!(parse_assignment::<f64>("--set", "A=1.5"), Ok(("A".to_string(), 1.5)));
        assert_eq!(parse_assignment::<i32>("--priority", "f(x)=-3"), Ok(("f(x)".to_string(), -3)));
        assert!(parse_assignment::<f64>("--set", "A").is_err());
        assert!(parse_assignment::<f64>("--set", "=1").is_err());
        assert!(parse_assignment::<i32>("--priority", "A=x").is_err());
    }

    #[test]
    fn cli_atoms_resolve_values_and_priorities() {
        let atoms = CliAtoms {
            values: HashMap::from([("A".to_string(), 1.0)]),
            priorities: HashMap::from([("B".to_string(), 7)]),
        };
        let expr = Expression::parse("B | A", atoms).unwrap();
        assert_eq!(expr.swaps(), 1);

        let run = expr.evaluate_verbose(&(), EvalFlags::empty());
        assert_eq!(run.value, 1.0);
        assert_eq!(run.trace_texts(), vec!["A"]);
        assert_eq!(run.metrics.failed, 0);
    }
}
