//! Console input
//!
//! One background thread reads stdin lines and feeds them over a
//! channel; the conversation loop consumes them with or without a
//! timeout, and polls between awaits so a key press can interrupt
//! speech mid-utterance.

use std::time::Duration;

use tokio::sync::mpsc;

/// Summary printed for the `help` built-in
pub const HELP_TEXT: &str = "\
Available commands:
  <anything else>        sent to the model as your task
  search for <query>     the model replies with a search URL, fetched and summarized
  what's the time/date   answered locally
  refine                 merge the conversation history into the memory catalog
  stop                   interrupt speech output
  help                   this summary
  exit | quit | goodbye  save history and leave";

/// Built-in directives recognized before the model is consulted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Save history, say goodbye, leave
    Exit,
    /// Interrupt speech output
    StopSpeaking,
    /// Print the command summary
    Help,
    /// Answer with the local time
    Time,
    /// Answer with the local date
    Date,
    /// Run memory refinement
    Refine,
    /// Everything else: a task for the model
    Task(String),
}

impl Directive {
    /// Classify one line of user input (typed or transcribed)
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.to_lowercase().as_str() {
            "exit" | "quit" | "goodbye" => Self::Exit,
            "stop" => Self::StopSpeaking,
            "help" | "show help" => Self::Help,
            "what's the time" | "what time is it" => Self::Time,
            "what's the date" | "what date is it" => Self::Date,
            "refine" | "refine memory" => Self::Refine,
            _ => Self::Task(trimmed.to_string()),
        }
    }
}

/// Choice offered by the startup menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Continue,
    Refine,
}

/// Line-oriented console fed by a background stdin reader
pub struct Console {
    rx: mpsc::UnboundedReceiver<String>,
}

impl Console {
    /// Spawn the stdin reader thread
    #[must_use]
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match std::io::BufRead::read_line(&mut stdin.lock(), &mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(line.trim_end_matches(['\r', '\n']).to_string()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self { rx }
    }

    /// Build a console from an existing channel (used by tests)
    #[cfg(test)]
    pub(crate) fn from_channel(rx: mpsc::UnboundedReceiver<String>) -> Self {
        Self { rx }
    }

    /// Next line; `None` once stdin is closed
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Next line within `wait`; `None` on expiry or closed stdin
    pub async fn next_line_timeout(&mut self, wait: Duration) -> Option<String> {
        tokio::time::timeout(wait, self.rx.recv()).await.ok().flatten()
    }

    /// Most recent pending line without waiting, if any
    pub fn poll_line(&mut self) -> Option<String> {
        let mut latest = None;
        while let Ok(line) = self.rx.try_recv() {
            latest = Some(line);
        }
        latest
    }

    /// Startup menu: continue now or refine memory first
    ///
    /// Expiry of the wait continues, matching an unattended start.
    pub async fn startup_menu(&mut self, wait: Duration) -> MenuChoice {
        if wait.is_zero() {
            return MenuChoice::Continue;
        }

        println!(
            "Press Enter to continue or type `refine` to update memory from the \
             conversation history ({}s)...",
            wait.as_secs()
        );

        match self.next_line_timeout(wait).await {
            Some(line) if Directive::parse(&line) == Directive::Refine => MenuChoice::Refine,
            _ => MenuChoice::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_directives_parse() {
        assert_eq!(Directive::parse("exit"), Directive::Exit);
        assert_eq!(Directive::parse("  Quit "), Directive::Exit);
        assert_eq!(Directive::parse("GOODBYE"), Directive::Exit);
        assert_eq!(Directive::parse("stop"), Directive::StopSpeaking);
        assert_eq!(Directive::parse("show help"), Directive::Help);
        assert_eq!(Directive::parse("what time is it"), Directive::Time);
        assert_eq!(Directive::parse("what's the date"), Directive::Date);
        assert_eq!(Directive::parse("refine memory"), Directive::Refine);
    }

    #[test]
    fn anything_else_is_a_task() {
        assert_eq!(
            Directive::parse("ping the router"),
            Directive::Task("ping the router".to_string())
        );
        // a sentence merely containing a keyword is still a task
        assert_eq!(
            Directive::parse("stop the music download"),
            Directive::Task("stop the music download".to_string())
        );
    }

    #[tokio::test]
    async fn menu_defaults_to_continue_on_expiry() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut console = Console::from_channel(rx);
        let choice = console.startup_menu(Duration::from_millis(10)).await;
        assert_eq!(choice, MenuChoice::Continue);
    }

    #[tokio::test]
    async fn menu_refine_is_recognized() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("refine".to_string()).unwrap();
        let mut console = Console::from_channel(rx);
        let choice = console.startup_menu(Duration::from_secs(5)).await;
        assert_eq!(choice, MenuChoice::Refine);
    }

    #[tokio::test]
    async fn poll_line_returns_latest_pending() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("first".to_string()).unwrap();
        tx.send("second".to_string()).unwrap();
        let mut console = Console::from_channel(rx);
        assert_eq!(console.poll_line(), Some("second".to_string()));
        assert_eq!(console.poll_line(), None);
    }

    #[tokio::test]
    async fn timeout_expiry_yields_none() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut console = Console::from_channel(rx);
        assert!(console.next_line_timeout(Duration::from_millis(5)).await.is_none());
    }
}
