//! Operator-facing console messages.

use std::fmt::Write;

use crate::config::LOOPBACK_URL_BASE;

const RULE_WIDTH: usize = 50;

/// Connection instructions printed once the listener is up.
pub fn banner_text(lan_host: &str, port: u16) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "HTTPS server is running!");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out);
    let _ = writeln!(out, "From a mobile device on the same network:");
    let _ = writeln!(out, "   https://{lan_host}:{port}");
    let _ = writeln!(out);
    let _ = writeln!(out, "From this computer:");
    let _ = writeln!(out, "   {LOOPBACK_URL_BASE}:{port}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Notes:");
    let _ = writeln!(out, "   1. If the browser shows a \"Not secure\" warning,");
    let _ = writeln!(out, "      choose \"Advanced\" -> \"Proceed\" to continue");
    let _ = writeln!(out, "   2. Allow camera access when mobile Chrome/Safari asks");
    let _ = writeln!(out);
    let _ = writeln!(out, "Press Ctrl+C to stop");
    let _ = writeln!(out, "{rule}");

    out
}

pub fn print_banner(lan_host: &str, port: u16) {
    println!("{}", banner_text(lan_host, port));
}

/// Acknowledgment printed when the interrupt arrives.
pub fn shutdown_text() -> &'static str {
    "\nShutting down server..."
}

pub fn print_shutdown() {
    println!("{}", shutdown_text());
}
