//! Conversation loop
//!
//! Ties the pipeline together: capture, transcription, prompt assembly,
//! the generate call, reply interpretation, side effects, and history
//! persistence. One turn at a time, no retries; transient failures
//! degrade to apologies or history events and the loop keeps going.

use std::time::{Duration, Instant};

use crate::console::{Console, Directive, HELP_TEXT, MenuChoice};
use crate::history::{ConversationLog, Role};
use crate::inference::InferenceClient;
use crate::interpret;
use crate::memory::MemoryCatalog;
use crate::prompt;
use crate::session::Session;
use crate::shell::CommandRunner;
use crate::voice::{
    Recorder, SAMPLE_RATE, SpeechTask, Transcriber, Transcript, UtteranceDetector, encode_wav,
};
use crate::web::{self, PageFetcher};
use crate::Result;

/// Fixed reply recorded when the inference endpoint cannot be reached
const APOLOGY: &str = "I'm having trouble reaching the language model.";

/// Capture chunk cadence while listening
const CAPTURE_POLL: Duration = Duration::from_millis(100);

/// Page fetch timeout
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest we wait for the farewell utterance before exiting anyway
const FAREWELL_GRACE: Duration = Duration::from_secs(10);

/// What one listening round produced
enum Heard {
    /// A captured utterance
    Utterance(Vec<f32>),
    /// Capture ended without any speech energy
    Silence,
    /// The user typed a line instead of speaking
    Typed(String),
}

/// The assistant's request/response loop
pub struct Assistant {
    session: Session,
    client: InferenceClient,
    console: Console,
    log: ConversationLog,
    memory: MemoryCatalog,
    speech: SpeechTask,
    runner: CommandRunner,
    fetcher: PageFetcher,
    recorder: Option<Recorder>,
    transcriber: Option<Transcriber>,
}

impl Assistant {
    /// Assemble the pipeline for a session
    ///
    /// With `text_only` (or voice disabled in config) the microphone and
    /// transcriber are never opened and input comes from the console.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built, or if voice
    /// input is wanted but no usable capture device exists
    pub fn new(
        session: Session,
        client: InferenceClient,
        console: Console,
        text_only: bool,
    ) -> Result<Self> {
        let config = &session.config;
        let voice_input = config.voice.enabled && !text_only;

        let recorder = voice_input.then(Recorder::new).transpose()?;
        let transcriber = voice_input.then(|| Transcriber::new(&config.voice));

        let header = format!(
            "--- session {} | model {} | {} ---",
            session.id,
            session.model,
            session.current_date()
        );

        Ok(Self {
            log: ConversationLog::new(config.history_path(), config.history_window)
                .with_header(header),
            memory: MemoryCatalog::new(config.memory_path()),
            speech: SpeechTask::new(&config.voice),
            runner: CommandRunner::new(config.exec.clone()),
            fetcher: PageFetcher::new(FETCH_TIMEOUT)?,
            recorder,
            transcriber,
            session,
            client,
            console,
        })
    }

    /// The conversation log (exposed for inspection and tests)
    #[must_use]
    pub fn history(&self) -> &ConversationLog {
        &self.log
    }

    /// Run until the user leaves or stdin closes
    ///
    /// # Errors
    ///
    /// Returns error only for startup-class failures; per-turn failures
    /// degrade into history entries
    pub async fn run(&mut self) -> Result<()> {
        let menu_wait = Duration::from_secs(self.session.config.menu_wait_secs);
        if self.console.startup_menu(menu_wait).await == MenuChoice::Refine {
            self.refine_memory().await;
        }

        println!("Ready. Type `help` for commands.");
        self.speech.start("Welcome back!");

        loop {
            let input = tokio::select! {
                input = Self::next_input(
                    &mut self.console,
                    &mut self.recorder,
                    self.transcriber.as_ref(),
                    &self.session,
                ) => input?,
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    break;
                }
            };

            let Some(input) = input else {
                // stdin closed
                break;
            };

            match Directive::parse(&input) {
                Directive::Exit => break,
                Directive::StopSpeaking => {
                    self.speech.cancel();
                    println!("Speech stopped.");
                }
                Directive::Help => println!("{HELP_TEXT}"),
                Directive::Time => {
                    let line = format!("The time is {}.", self.session.current_time());
                    println!("{line}");
                    self.speech.start(&line);
                }
                Directive::Date => {
                    let line = format!("Today's date is {}.", self.session.current_date());
                    println!("{line}");
                    self.speech.start(&line);
                }
                Directive::Refine => self.refine_memory().await,
                Directive::Task(task) if task.is_empty() => {
                    // bare Enter doubles as a speech interrupt
                    self.speech.cancel();
                }
                Directive::Task(task) => {
                    self.turn(&task).await;
                }
            }

            if let Err(e) = self.log.save() {
                tracing::error!(error = %e, "history save failed");
            }
        }

        self.shutdown().await
    }

    /// Process one user task end to end
    pub async fn turn(&mut self, task: &str) {
        self.log.record(Role::User, task);

        let memory_text = self.memory.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "memory catalog unreadable");
            String::new()
        });
        let prompt =
            prompt::assemble(&self.session, &self.log.render_window(), &memory_text, task);

        let reply = match self.client.generate(&self.session.model, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "generate failed");
                println!("{APOLOGY}");
                self.log.record(Role::Assistant, APOLOGY);
                self.speech.start(APOLOGY);
                return;
            }
        };

        self.handle_reply(&reply).await;
    }

    /// Act on an interpreted reply: lookups, commands, then the prose
    pub async fn handle_reply(&mut self, reply: &str) {
        let parts = interpret::interpret(reply);

        for url in &parts.urls {
            self.fetch_and_summarize(url).await;
        }

        match &parts.command {
            Ok(block) => {
                for report in self.runner.execute_block(block) {
                    let line = report.describe();
                    println!("{line}");
                    self.log.record(Role::Event, line);
                }
            }
            Err(e) => {
                self.log.record(Role::Event, format!("command extraction failed: {e}"));
            }
        }

        if !parts.prose.is_empty() {
            println!("{}", parts.prose);
            self.speech.start(&parts.prose);
        }
        self.log.record(Role::Assistant, parts.prose);
    }

    /// Fetch one URL, summarize its visible text, speak the summary
    async fn fetch_and_summarize(&mut self, url: &str) {
        println!("Fetching {url}...");

        let body = match self.fetcher.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url, error = %e, "fetch failed");
                self.log.record(Role::Event, format!("fetch failed for {url}: {e}"));
                return;
            }
        };

        let page_text = web::visible_text(&body);
        match self
            .client
            .generate(&self.session.model, &web::summarize_prompt(&page_text))
            .await
        {
            Ok(summary) => {
                println!("{summary}");
                self.log.record(Role::Event, format!("summary of {url}: {summary}"));
                self.speech.start(&summary);
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "summarization failed");
                self.log.record(Role::Event, format!("summarization failed for {url}: {e}"));
            }
        }
    }

    /// Merge the on-disk transcript into the memory catalog
    async fn refine_memory(&mut self) {
        println!("Refining memory from conversation history...");

        let transcript = match self.log.transcript() {
            Ok(transcript) => transcript,
            Err(e) => {
                tracing::warn!(error = %e, "history transcript unreadable");
                return;
            }
        };
        let current = self.memory.load().unwrap_or_default();

        match self
            .client
            .generate(
                &self.session.model,
                &MemoryCatalog::refine_prompt(&transcript, &current),
            )
            .await
        {
            Ok(refined) => match self.memory.append(&refined) {
                Ok(()) => println!("Memory updated."),
                Err(e) => tracing::error!(error = %e, "memory append failed"),
            },
            Err(e) => println!("Memory refinement failed: {e}"),
        }
    }

    /// Next user turn: typed line in text mode, else captured speech
    ///
    /// Re-captures on silence and on unintelligible audio — those are
    /// never submitted as turns.
    async fn next_input(
        console: &mut Console,
        recorder: &mut Option<Recorder>,
        transcriber: Option<&Transcriber>,
        session: &Session,
    ) -> Result<Option<String>> {
        let (Some(recorder), Some(transcriber)) = (recorder, transcriber) else {
            println!("You:");
            return Ok(console.next_line().await);
        };

        loop {
            println!("Listening... (pause to finish, Enter to cut short)");
            let heard = Self::capture_utterance(console, recorder).await?;

            let samples = match heard {
                Heard::Typed(line) => return Ok(Some(line)),
                Heard::Silence => {
                    println!("Heard nothing; still listening.");
                    continue;
                }
                Heard::Utterance(samples) => samples,
            };

            let wav = encode_wav(&samples, SAMPLE_RATE)?;
            if let Err(e) = std::fs::write(session.config.utterance_path(), &wav) {
                tracing::warn!(error = %e, "could not persist utterance");
            }

            match transcriber.transcribe(wav).await {
                Ok(Transcript::Text(text)) => {
                    println!("You said: {text}");
                    return Ok(Some(text));
                }
                Ok(Transcript::NoSpeech) => {
                    println!("Heard nothing; still listening.");
                }
                Ok(Transcript::Unintelligible) => {
                    println!("Could not make that out; please try again.");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transcription unavailable");
                    println!("Transcription unavailable; try again or type instead.");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// Record until sustained silence or a console line
    async fn capture_utterance(console: &mut Console, recorder: &mut Recorder) -> Result<Heard> {
        recorder.start()?;
        let mut detector = UtteranceDetector::new();
        let mut utterance: Vec<f32> = Vec::new();

        loop {
            tokio::time::sleep(CAPTURE_POLL).await;

            let chunk = recorder.drain();
            let complete = detector.feed(&chunk);
            utterance.extend(chunk);

            if let Some(line) = console.poll_line() {
                recorder.stop();
                if !line.trim().is_empty() {
                    return Ok(Heard::Typed(line));
                }
                if detector.heard_speech() {
                    return Ok(Heard::Utterance(utterance));
                }
                return Ok(Heard::Silence);
            }

            if complete {
                recorder.stop();
                return Ok(Heard::Utterance(utterance));
            }
        }
    }

    /// Persist history and say goodbye before leaving
    async fn shutdown(&mut self) -> Result<()> {
        if let Err(e) = self.log.save() {
            tracing::error!(error = %e, "final history save failed");
        }

        println!("Goodbye!");
        self.speech.start("Goodbye!");

        let deadline = Instant::now() + FAREWELL_GRACE;
        while self.speech.is_busy() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Ok(())
    }
}
