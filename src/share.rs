use anyhow::{Context, Result};
use arboard::Clipboard;
use std::io::{self, Write};
use textcrypt::capability::ShareSink;

/// Puts the text on the system clipboard.
pub struct ClipboardShare;

impl ShareSink for ClipboardShare {
    fn share(&self, text: &str) -> Result<()> {
        let mut clipboard = Clipboard::new().context("clipboard is not available")?;
        clipboard
            .set_text(text.to_owned())
            .context("failed to copy to clipboard")?;
        Ok(())
    }
}

/// Prints a ready-to-send message to stdout.
pub struct MessageShare;

impl ShareSink for MessageShare {
    fn share(&self, text: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out)?;
        writeln!(out, "----- message -----")?;
        writeln!(out, "{text}")?;
        writeln!(out, "-------------------")?;
        Ok(())
    }
}
