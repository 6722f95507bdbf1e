use anyhow::Result;
use std::io::{self, BufRead, IsTerminal, Write};
use textcrypt::capability::Authenticator;
use tracing::warn;
use zeroize::Zeroizing;

const PIN_ENV: &str = "TEXTCRYPT_REVEAL_PIN";

/// Gates history reveals on the terminal.
///
/// With `TEXTCRYPT_REVEAL_PIN` set, the user must enter that PIN. Without it,
/// an interactive user confirms with "yes" and non-interactive callers are
/// always denied.
pub struct ConsoleAuthenticator;

impl Authenticator for ConsoleAuthenticator {
    fn authenticate(&self, reason: &str) -> bool {
        match verify(reason) {
            Ok(granted) => granted,
            Err(e) => {
                warn!(error = %e, "authentication aborted");
                false
            }
        }
    }
}

fn verify(reason: &str) -> Result<bool> {
    //  TEXTCRYPT_REVEAL_PIN="1234" textcrypt history show 0 --reveal
    if let Ok(pin) = std::env::var(PIN_ENV) {
        if !pin.is_empty() {
            let expected = Zeroizing::new(pin);
            let entered = read_pin(reason)?;
            return Ok(entered.as_str() == expected.as_str());
        }
    }

    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    eprint!("{reason}. Type 'yes' to continue: ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

fn read_pin(reason: &str) -> Result<Zeroizing<String>> {
    //  stdin (Pipeline)
    //  echo "1234" | textcrypt history show 0 --reveal
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().lock().read_line(&mut buf)?;
        trim_newline(&mut buf);
        return Ok(buf);
    }

    //  Interactive (TTY)
    let pin = rpassword::prompt_password(format!("{reason}\nPIN: "))?;
    Ok(Zeroizing::new(pin))
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
