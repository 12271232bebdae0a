use std::io::{self, BufRead, IsTerminal, Write};

use clap::Parser;

use crate::cli::commands::{ShellCommand, ShellLine};

use super::{CmdResult, Context, Runner, finish};

/// Interactive loop. The store stays open between lines and the reset
/// coordinator runs in the background, so a shell left open over
/// midnight starts the new day unchecked.
pub fn cmd_shell(ctx: &Context) -> CmdResult {
    let session = ctx.open_session(true)?;
    let interactive = io::stdin().is_terminal();
    if interactive {
        println!("daylist shell. Type `help` for commands, `quit` to leave.");
    }

    {
        let mut runner = Runner::new(ctx, &session);
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            if interactive {
                print!("> ");
                io::stdout().flush()?;
            }
            let Some(line) = lines.next() else { break };
            let line = line?;

            let words = match split_words(&line) {
                Ok(words) => words,
                Err(e) => {
                    println!("error: {}", e);
                    continue;
                }
            };
            if words.is_empty() {
                continue;
            }

            match ShellLine::try_parse_from(&words) {
                // Help and usage errors both land here; clap renders them
                Err(e) => {
                    let _ = e.print();
                }
                Ok(ShellLine {
                    command: ShellCommand::Quit,
                }) => break,
                Ok(ShellLine {
                    command: ShellCommand::Store(cmd),
                }) => {
                    if let Err(e) = runner.run(cmd) {
                        println!("error: {}", e);
                    }
                }
            }
        }
    }

    finish(ctx, session);
    Ok(())
}

/// Split a line on whitespace, honoring single and double quotes.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }
    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_plain_words() {
        assert_eq!(
            split_words("add buy milk").unwrap(),
            vec!["add", "buy", "milk"]
        );
    }

    #[test]
    fn split_quoted_words() {
        assert_eq!(
            split_words(r#"add "buy  milk" -g 'Home Stuff'"#).unwrap(),
            vec!["add", "buy  milk", "-g", "Home Stuff"]
        );
    }

    #[test]
    fn split_empty_quotes_is_a_word() {
        assert_eq!(split_words(r#"add """#).unwrap(), vec!["add", ""]);
    }

    #[test]
    fn split_blank_line() {
        assert!(split_words("   ").unwrap().is_empty());
    }

    #[test]
    fn split_unterminated_quote() {
        assert!(split_words("add \"oops").is_err());
    }

    #[test]
    fn shell_line_parses_store_commands() {
        let line = ShellLine::try_parse_from(["group", "add", "Work"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Store(_)));
        let line = ShellLine::try_parse_from(["exit"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Quit));
    }
}
