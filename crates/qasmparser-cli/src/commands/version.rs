//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - error-tolerant OpenQASM 3.0 parser",
        style("qasmparse").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qasmparser      Lexer, parser, AST, visitors and emitter");
    println!("  qasmparser-cli  Command-line interface");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
