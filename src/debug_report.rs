use atomexpr::{AtomProvider, EvalFlags, Evaluation, Expression, ParseError};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run<P: AtomProvider>(expr: &Expression<P>, run: &Evaluation<'_, P::Data>, flags: EvalFlags, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Expression: \"{}\"", expr.source().trim()), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Tree ━━━", ansi::GRAY));
    println!("  {} {}", palette.dim("canonical:"), palette.paint(expr.to_string(), ansi::GREEN));
    println!(
        "  {} {}  {} {}  {} {}",
        palette.dim("atoms:"),
        palette.paint(expr.atom_count().to_string(), ansi::YELLOW),
        palette.dim("depth:"),
        palette.paint(expr.depth().to_string(), ansi::YELLOW),
        palette.dim("reordered:"),
        palette.paint(expr.swaps().to_string(), ansi::YELLOW),
    );

    println!("\n{}", palette.paint("━━━ Atoms ━━━", ansi::GRAY));
    print_atoms(expr, run, &palette);

    println!("\n{}", palette.paint("━━━ Evaluation ━━━", ansi::GRAY));
    let mode = if flags.contains(EvalFlags::WEIGHTED) { "weighted" } else { "boolean" };
    let value = if run.value != 0.0 { palette.paint(run.value.to_string(), ansi::GREEN) } else { palette.dim("0") };
    println!("  {} {}  {}", palette.bold("Result:"), palette.bold(value), palette.dim(format!("({mode})")));

    if run.trace.is_empty() {
        println!("  {}", palette.dim("No atoms invoked"));
    } else {
        let trace: Vec<String> = run.trace.iter().map(|atom| palette.paint(atom.text(), ansi::BLUE)).collect();
        println!("  {} {}", palette.dim("trace:"), trace.join(palette.dim(" → ").as_str()));
    }

    println!("\n{}", palette.paint("━━━ Metrics ━━━", ansi::GRAY));
    let failed = if run.metrics.failed > 0 {
        palette.paint(run.metrics.failed.to_string(), ansi::RED)
    } else {
        palette.dim("0")
    };
    println!(
        "  Time: {}  │  Invoked: {}  │  Skipped: {}  │  Failed: {}",
        palette.paint(format!("{:?}", run.metrics.elapsed), ansi::GREEN),
        palette.paint(run.metrics.invoked.to_string(), ansi::CYAN),
        palette.dim(run.metrics.skipped.to_string()),
        failed,
    );
    if run.metrics.failed > 0 {
        println!("\n{}", palette.dim("  Tip: failing atoms count as 0; the warnings above name the cause"));
    }
    println!();
}

fn print_atoms<P: AtomProvider>(expr: &Expression<P>, run: &Evaluation<'_, P::Data>, palette: &ansi::Palette) {
    for atom in expr.atoms() {
        let invoked = run.trace.iter().position(|traced| traced.index() == atom.index());
        let status = match invoked {
            Some(step) => palette.paint(format!("✓ step {}", step + 1), ansi::GREEN),
            None => palette.dim("✗ skipped"),
        };
        println!(
            "  {} {} {} {}  {} {}",
            palette.paint(format!("[{}]", atom.index()), ansi::GRAY),
            palette.bold(palette.paint(atom.text(), ansi::BLUE)),
            palette.dim("│"),
            palette.paint(format!("offset {}", atom.offset()), ansi::YELLOW),
            palette.dim(format!("priority {}", atom.priority())),
            status,
        );
    }
}

pub fn print_parse_error(input: &str, err: &ParseError, color: bool) {
    let palette = ansi::Palette::new(color);
    eprintln!("\n{}", palette.bold(palette.paint(format!("⚙  Expression: \"{input}\""), ansi::CYAN)));
    eprintln!("\n{}", palette.paint("━━━ Parse error ━━━", ansi::GRAY));
    eprintln!("  {}", palette.paint(err.to_string(), ansi::RED));

    let offset = err.offset().min(input.len());
    if let Some(prefix) = input.get(..offset) {
        eprintln!("\n  {}", palette.dim(input));
        eprintln!("  {}{}", " ".repeat(prefix.chars().count()), palette.paint("^", ansi::YELLOW));
    }
    eprintln!();
}
