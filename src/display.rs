use console::style;
use std::io::{self, Write};

const LOGO: &str = r#"
  _       _           _
 | |_ ___| |__   __ _| |_
 | __/ __| '_ \ / _` | __|
 | || (__| | | | (_| | |_
  \__\___|_| |_|\__,_|\__|
"#;

/// Logo plus the package version
pub fn display_banner(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", style(LOGO).bold().cyan())?;
    writeln!(
        out,
        "{}\n",
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
    )
}

pub fn display_success(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{}", style(message).green())
}

pub fn display_warning(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{}", style(message).yellow())
}

pub fn display_error(out: &mut dyn Write, label: &str, detail: &str) -> io::Result<()> {
    writeln!(out, "{}{}", style(label).bold().red(), detail)
}

/// Numbered list, starting at 1
pub fn display_model_list(out: &mut dyn Write, title: &str, models: &[String]) -> io::Result<()> {
    writeln!(out, "{}", style(title).bold())?;
    for (index, model) in models.iter().enumerate() {
        writeln!(out, "{}: {}", style(index + 1).cyan(), model)?;
    }
    Ok(())
}

pub fn display_chat_header(
    out: &mut dyn Write,
    start_label: &str,
    model_label: &str,
    model: &str,
) -> io::Result<()> {
    writeln!(
        out,
        "\n{} ({}{})",
        style(start_label).bold().magenta(),
        model_label,
        style(model).cyan()
    )
}

pub fn display_system_prompt(out: &mut dyn Write, label: &str, prompt: &str) -> io::Result<()> {
    writeln!(out, "\n{}{}", style(label).bold().yellow(), prompt)
}

pub fn display_bot_label(out: &mut dyn Write, label: &str) -> io::Result<()> {
    writeln!(out, "{}", style(label).bold().blue())?;
    out.flush()
}

/// Writes one streamed fragment and flushes so it shows up immediately.
pub fn write_token(out: &mut dyn Write, token: &str) -> io::Result<()> {
    out.write_all(token.as_bytes())?;
    out.flush()
}
