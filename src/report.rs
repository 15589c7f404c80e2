//! Human-readable run summary for terminal output.
//!
//! Hash lines own stdout, so the CLI prints this summary to stderr.
use colored::*;

use crate::engine::Engine;
use crate::hash::ServerMode;

fn visible_len(s: &str) -> usize {
    // Strip ANSI escape sequences (\x1b[ ... m) to compute printable width
    let mut len = 0;
    let mut iter = s.chars().peekable();
    while let Some(ch) = iter.next() {
        if ch == '\u{1b}' {
            if let Some('[') = iter.peek().cloned() {
                let _ = iter.next();
            }
            for c in iter.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            len += 1;
        }
    }
    len
}

fn section_header(title: &str) -> String {
    let len = visible_len(title);
    let mut s = String::new();
    s.push('\n');
    s.push_str(title);
    s.push('\n');
    s.push_str(&"─".repeat(len));
    s.push_str("\n\n");
    s
}

pub fn render_summary(engine: &Engine) -> String {
    let s = &engine.stats;
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        "krbng2john: Kerberos pre-auth extraction".bold().cyan()
    ));

    out.push_str(&section_header(&"Dumps".bold().yellow().to_string()));
    out.push_str(&format!("Processed: {}\n", s.files));
    let failed = format!("Failed: {}", s.files_failed);
    if s.files_failed > 0 {
        out.push_str(&format!("{}\n", failed.red()));
    } else {
        out.push_str(&format!("{}\n", failed));
    }

    out.push_str(&section_header(&"Kerberos Messages".bold().yellow().to_string()));
    out.push_str(&format!("Total: {}\n", s.messages));
    for (label, n) in [
        ("AS-REQ", s.as_req),
        ("KRB-ERROR", s.krb_error),
        ("AS-REP", s.as_rep),
    ] {
        out.push_str(&format!("  {}: {}\n", label.bold().blue(), n));
    }
    out.push_str(&format!("Out-of-sequence KRB-ERROR: {}\n", s.out_of_sequence));

    out.push_str(&section_header(&"Exchanges".bold().cyan().to_string()));
    let ad = engine
        .hashes
        .iter()
        .filter(|h| h.hash.mode() == ServerMode::Ad)
        .count();
    out.push_str(&format!("Emitted: {}\n", s.exchanges.to_string().green()));
    out.push_str(&format!("  AD ($krb5ng$1$): {}\n", ad));
    out.push_str(&format!(
        "  plain ($krb5ng$0$): {}\n",
        engine.hashes.len() - ad
    ));
    if s.exchange_errors > 0 {
        out.push_str(&format!(
            "{}\n",
            format!("Dropped (incomplete capture): {}", s.exchange_errors).red()
        ));
    } else {
        out.push_str(&format!("Dropped (incomplete capture): {}\n", "0".dimmed()));
    }
    out
}
