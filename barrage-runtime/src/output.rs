//! Rendering finished phases to stdout.
use crate::cli::Format;
use crate::presets::Phase;
use std::io::{self, Write};

pub fn render(phases: &[Phase], format: Format) -> anyhow::Result<String> {
    match format {
        Format::Text => Ok(phases
            .iter()
            .map(|phase| {
                format!(
                    "--- {} ---\nTarget:           {}\n{}\n",
                    phase.title, phase.target, phase.report
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
        Format::Json => Ok(serde_json::to_string_pretty(phases)?),
    }
}

pub fn print(phases: &[Phase], format: Format) -> anyhow::Result<()> {
    let rendered = render(phases, format)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    stdout.flush()?;
    Ok(())
}
