//! Interactive review shell.
//!
//! One command is read, run to completion, and reported before the next is
//! read. Errors are printed and the shell keeps going; nothing an action does
//! can end the session except `quit` or end of input.

use std::io::{BufRead, Write};

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};

use migreview_core::llm::client::{ApiKey, ModelClient};
use migreview_core::review::{run_cancellable, run_review};
use migreview_core::{MigReviewError, OutputMode, Session};

use crate::{render, secret};

const HELP: &str = "\
Commands:
  key                     set the Gemini API key (hidden when typed at a terminal)
  schema                  enter the current schema
  ddl                     enter the DDL you plan to run
  rules [show|edit|save|reset]
                          view or change the rulebook (edits apply on save)
  incidents [show|edit|save|reset]
                          view or change the incident log (edits apply on save)
  mode [plain|structured] show or set the answer format
  show                    show what will be sent
  review                  send the review to Gemini (Ctrl-C cancels)
  raw                     show the model response behind the last failed review
  help                    show this help
  quit                    leave (Ctrl-D also works)

Multi-line input ends with a line containing only `.`
Once a review has run, Ctrl-C only cancels reviews; leave with `quit` or Ctrl-D.";

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy)]
enum ContextKind {
    Rulebook,
    Incidents,
}

impl ContextKind {
    fn label(self) -> &'static str {
        match self {
            ContextKind::Rulebook => "Rulebook",
            ContextKind::Incidents => "Incident log",
        }
    }

    fn command(self) -> &'static str {
        match self {
            ContextKind::Rulebook => "rules",
            ContextKind::Incidents => "incidents",
        }
    }
}

/// The interactive shell. `connect` turns an API key into a model client;
/// the client is built once per key and reused for every review.
pub struct Shell<R, W, F, C> {
    input: R,
    out: W,
    connect: F,
    client: Option<C>,
    session: Session,
    schema: String,
    ddl: String,
    rulebook_draft: Option<String>,
    incidents_draft: Option<String>,
    mode: OutputMode,
    last_raw: Option<String>,
    interactive: bool,
}

impl<R, W, F, C> Shell<R, W, F, C>
where
    R: BufRead,
    W: Write,
    F: Fn(ApiKey) -> migreview_core::Result<C>,
    C: ModelClient,
{
    pub fn new(input: R, out: W, session: Session, connect: F) -> Self {
        Self {
            input,
            out,
            connect,
            client: None,
            session,
            schema: String::new(),
            ddl: String::new(),
            rulebook_draft: None,
            incidents_draft: None,
            mode: OutputMode::default(),
            last_raw: None,
            interactive: false,
        }
    }

    /// Show a spinner and listen for Ctrl-C while a review is running.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Store the key in the session and build a client for it.
    pub fn set_api_key(&mut self, key: ApiKey) -> migreview_core::Result<()> {
        let client = (self.connect)(key.clone())?;
        self.session.set_api_key(key);
        self.client = Some(client);
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        writeln!(
            self.out,
            "migreview {} (model: {}). Type `help` for commands.",
            env!("CARGO_PKG_VERSION"),
            migreview_core::llm::client::MODEL_ID,
        )?;

        loop {
            write!(self.out, "migreview> ")?;
            self.out.flush()?;

            let Some(line) = self.read_line()? else {
                writeln!(self.out)?;
                break;
            };

            match self.dispatch(line.trim()).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(err) => self.report(err)?,
            }
        }

        Ok(())
    }

    async fn dispatch(&mut self, line: &str) -> Result<Flow> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Flow::Continue);
        };
        let arg = words.next();

        match command {
            "help" | "?" => writeln!(self.out, "{}", HELP)?,
            "quit" | "exit" => return Ok(Flow::Quit),
            "key" => self.read_key()?,
            "schema" => {
                self.schema = self.read_block("Paste the current schema")?;
                writeln!(self.out, "Schema set ({} lines).", self.schema.lines().count())?;
            }
            "ddl" => {
                self.ddl = self.read_block("Paste the planned DDL")?;
                writeln!(self.out, "DDL set ({} lines).", self.ddl.lines().count())?;
            }
            "rules" => self.context_command(ContextKind::Rulebook, arg)?,
            "incidents" => self.context_command(ContextKind::Incidents, arg)?,
            "mode" => self.mode_command(arg)?,
            "show" => self.show()?,
            "review" => self.review().await?,
            "raw" => match &self.last_raw {
                Some(raw) => render::render_raw(&mut self.out, raw)?,
                None => writeln!(self.out, "No failed model response to show.")?,
            },
            other => bail!("Unknown command '{}'. Type `help` for commands.", other),
        }

        Ok(Flow::Continue)
    }

    fn report(&mut self, err: anyhow::Error) -> Result<()> {
        if let Some(raw) = err
            .downcast_ref::<MigReviewError>()
            .and_then(|e| e.raw_response())
        {
            self.last_raw = Some(raw.to_string());
        }
        render::render_error(&mut self.out, &err, false)?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Read lines until a lone `.` or end of input.
    fn read_block(&mut self, what: &str) -> Result<String> {
        writeln!(self.out, "{} (end with a line containing only `.`):", what)?;
        self.out.flush()?;

        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.trim() == "." {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    fn read_key(&mut self) -> Result<()> {
        let line = if self.interactive {
            match secret::read_secret(&mut self.out, "Gemini API key (input hidden): ")? {
                Some(line) => line,
                None => {
                    writeln!(self.out, "Key entry cancelled.")?;
                    return Ok(());
                }
            }
        } else {
            write!(self.out, "Gemini API key: ")?;
            self.out.flush()?;
            self.read_line()?.unwrap_or_default()
        };
        self.set_api_key(ApiKey::new(line)?)?;
        writeln!(self.out, "API key set for this session.")?;
        Ok(())
    }

    fn context_command(&mut self, kind: ContextKind, arg: Option<&str>) -> Result<()> {
        match arg.unwrap_or("show") {
            "show" => {
                let saved = match kind {
                    ContextKind::Rulebook => self.session.rulebook(),
                    ContextKind::Incidents => self.session.incidents(),
                };
                writeln!(self.out, "━━━ {} ━━━", kind.label())?;
                if saved.trim().is_empty() {
                    writeln!(self.out, "(empty, not sent with reviews)")?;
                } else {
                    writeln!(self.out, "{}", saved.trim_end())?;
                }
                if self.draft(kind).is_some() {
                    writeln!(
                        self.out,
                        "An unsaved edit is pending. `{} save` to apply it.",
                        kind.command()
                    )?;
                }
            }
            "edit" => {
                let text = self.read_block(&format!("Enter the new {}", kind.label().to_lowercase()))?;
                *self.draft_mut(kind) = Some(text);
                writeln!(
                    self.out,
                    "Edit stored. `{} save` to apply it.",
                    kind.command()
                )?;
            }
            "save" => match self.draft_mut(kind).take() {
                Some(text) => {
                    match kind {
                        ContextKind::Rulebook => self.session.save_rulebook(text),
                        ContextKind::Incidents => self.session.save_incidents(text),
                    }
                    writeln!(self.out, "{} saved.", kind.label())?;
                }
                None => writeln!(
                    self.out,
                    "Nothing to save. Use `{} edit` first.",
                    kind.command()
                )?,
            },
            "reset" => {
                match kind {
                    ContextKind::Rulebook => self.session.reset_rulebook(),
                    ContextKind::Incidents => self.session.reset_incidents(),
                }
                *self.draft_mut(kind) = None;
                writeln!(self.out, "{} reset to the default.", kind.label())?;
            }
            other => bail!(
                "Unknown {} action '{}'. Expected show, edit, save, or reset.",
                kind.command(),
                other
            ),
        }
        Ok(())
    }

    fn draft(&self, kind: ContextKind) -> Option<&String> {
        match kind {
            ContextKind::Rulebook => self.rulebook_draft.as_ref(),
            ContextKind::Incidents => self.incidents_draft.as_ref(),
        }
    }

    fn draft_mut(&mut self, kind: ContextKind) -> &mut Option<String> {
        match kind {
            ContextKind::Rulebook => &mut self.rulebook_draft,
            ContextKind::Incidents => &mut self.incidents_draft,
        }
    }

    fn mode_command(&mut self, arg: Option<&str>) -> Result<()> {
        if let Some(arg) = arg {
            self.mode = arg.parse().map_err(anyhow::Error::msg)?;
        }
        writeln!(self.out, "Output mode: {}", self.mode)?;
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        let key_state = if self.session.api_key().is_some() {
            "set"
        } else {
            "not set"
        };
        writeln!(self.out, "API key:      {}", key_state)?;
        writeln!(self.out, "Output mode:  {}", self.mode)?;
        writeln!(self.out, "Schema:       {} lines", self.schema.lines().count())?;
        writeln!(self.out, "DDL:          {} lines", self.ddl.lines().count())?;
        writeln!(
            self.out,
            "Rulebook:     {} lines",
            self.session.rulebook().trim().lines().count()
        )?;
        writeln!(
            self.out,
            "Incidents:    {} lines",
            self.session.incidents().trim().lines().count()
        )?;
        Ok(())
    }

    async fn review(&mut self) -> Result<()> {
        self.last_raw = None;

        let Some(client) = &self.client else {
            return Err(MigReviewError::MissingCredential.into());
        };
        if self.schema.trim().is_empty() {
            bail!("No schema entered. Use `schema` first.");
        }
        if self.ddl.trim().is_empty() {
            bail!("No DDL entered. Use `ddl` first.");
        }

        let request = self
            .session
            .review_request(self.schema.as_str(), self.ddl.as_str(), self.mode);

        let pb = if self.interactive {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("Waiting for Gemini... (Ctrl-C to cancel)");
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };

        let interactive = self.interactive;
        let cancel = async move {
            if !interactive || tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        let outcome = run_cancellable(run_review(client, &request), cancel).await;
        pb.finish_and_clear();

        let outcome = outcome?;
        render::render_outcome(&mut self.out, &outcome)?;
        Ok(())
    }
}
