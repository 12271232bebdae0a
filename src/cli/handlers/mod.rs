mod init;
mod shell;
pub use init::cmd_init;
pub use shell::cmd_shell;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, ConfigError};
use crate::io::gateway::{Gateway, JsonFileGateway};
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::config::Config;
use crate::model::group::DEFAULT_GROUP_ID;
use crate::model::todo::Todo;
use crate::ops::reset::{ResetOutcome, date_str};
use crate::ops::{check, group_ops, todo_ops};
use crate::store::clock::SystemClock;
use crate::store::session::{Session, SessionOptions};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs to find and open the task list.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub json: bool,
}

impl Context {
    pub fn new(data_dir: Option<&str>, json: bool) -> Result<Self, ConfigError> {
        Self::at(config_io::resolve_data_dir(data_dir.map(Path::new)), json)
    }

    /// Read the config of an already resolved data directory.
    pub fn at(data_dir: PathBuf, json: bool) -> Result<Self, ConfigError> {
        let config = config_io::read_config(&data_dir)?;
        Ok(Context {
            data_dir,
            config,
            json,
        })
    }

    pub fn document_path(&self) -> PathBuf {
        config_io::document_path(&self.data_dir, &self.config)
    }

    fn gateway(&self) -> JsonFileGateway {
        JsonFileGateway::new(self.document_path(), self.data_dir.clone())
    }

    /// Hydrate the store. `background_reset` starts the reset coordinator.
    pub fn open_session(&self, background_reset: bool) -> Result<Session, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.data_dir)?;
        let session = Session::open(
            Arc::new(self.gateway()),
            Arc::new(SystemClock),
            SessionOptions::from_config(&self.config, background_reset),
        )?;
        if session.report().seeded {
            log::info!(
                "event=document_seeded path={}",
                self.document_path().display()
            );
        }
        Ok(session)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(ctx: &Context, command: Option<Commands>) -> CmdResult {
    match command {
        // No subcommand → list the selected group
        None => run_once(
            ctx,
            StoreCommand::List(ListArgs {
                group: None,
                all: false,
            }),
        ),
        Some(Commands::Init(args)) => cmd_init(ctx, args),
        Some(Commands::Shell) => cmd_shell(ctx),
        Some(Commands::Check) => cmd_check(ctx),
        Some(Commands::Recovery(args)) => cmd_recovery(ctx, args),
        Some(Commands::Store(cmd)) => run_once(ctx, cmd),
    }
}

/// Open, run one command, flush, close.
fn run_once(ctx: &Context, cmd: StoreCommand) -> CmdResult {
    let session = ctx.open_session(false)?;
    let result = Runner::one_shot(ctx, &session).run(cmd);
    finish(ctx, session);
    result
}

/// Close a session. An unsaved state is a warning, not a failure: the
/// change itself was applied, and the final state goes to the recovery log.
pub(crate) fn finish(ctx: &Context, session: Session) {
    let store = session.store().clone();
    if let Err(e) = session.close() {
        let body = serde_json::to_string_pretty(&store.snapshot()).unwrap_or_default();
        recovery::log_recovery(
            &ctx.data_dir,
            RecoveryEntry::new(RecoveryCategory::Write, "unsaved at exit")
                .field("Target", ctx.document_path().display().to_string())
                .field("Error", e.to_string())
                .body(body),
        );
        eprintln!("warning: {}", e);
        eprintln!("warning: the unsaved task list was copied to the recovery log (dl recovery)");
    }
}

/// Append removed todos to the recovery log so a delete can be undone by
/// hand.
fn journal_removed(ctx: &Context, description: String, todos: &[Todo]) {
    if todos.is_empty() {
        return;
    }
    let body = serde_json::to_string_pretty(todos).unwrap_or_default();
    recovery::log_recovery(
        &ctx.data_dir,
        RecoveryEntry::new(RecoveryCategory::Delete, description)
            .field("Todos", todos.len().to_string())
            .body(body),
    );
}

// ---------------------------------------------------------------------------
// Store commands
// ---------------------------------------------------------------------------

/// Runs store commands against an open session. Shared by one-shot
/// commands and `dl shell`.
pub(crate) struct Runner<'a> {
    ctx: &'a Context,
    session: &'a Session,
    /// One-shot only: the reset done while opening, reported by `reset`
    /// when its own check finds the day already done
    hydration_reset: Option<ResetOutcome>,
}

impl<'a> Runner<'a> {
    /// For a long-lived session such as `dl shell`.
    pub(crate) fn new(ctx: &'a Context, session: &'a Session) -> Self {
        Runner {
            ctx,
            session,
            hydration_reset: None,
        }
    }

    /// For a session opened to run a single command.
    pub(crate) fn one_shot(ctx: &'a Context, session: &'a Session) -> Self {
        let reset = session.report().reset;
        Runner {
            hydration_reset: reset.changed().then_some(reset),
            ..Runner::new(ctx, session)
        }
    }

    pub(crate) fn run(&mut self, cmd: StoreCommand) -> CmdResult {
        match cmd {
            StoreCommand::List(args) => self.list(args),
            StoreCommand::Add(args) => self.add(args),
            StoreCommand::Toggle(args) => self.toggle(args),
            StoreCommand::Rm(args) => self.rm(args),
            StoreCommand::Group(cmd) => match cmd.action {
                GroupAction::List => self.group_list(),
                GroupAction::Add(args) => self.group_add(args),
                GroupAction::Rm(args) => self.group_rm(args),
                GroupAction::Select(args) => self.group_select(args),
            },
            StoreCommand::Reset => self.reset(),
            StoreCommand::Status => self.status(),
        }
    }

    fn resolve_group_id(&self, needle: &str) -> Result<String, String> {
        self.session
            .store()
            .read(|s| group_ops::resolve_group(s, needle).map(|g| g.id.clone()))
    }

    fn resolve_todo_id(&self, needle: &str) -> Result<String, String> {
        self.session
            .store()
            .read(|s| todo_ops::resolve_todo_id(s, needle).map(str::to_string))
    }

    /// The group new todos go to when none is named
    fn target_group(&self, explicit: Option<&str>) -> Result<String, String> {
        match explicit {
            Some(needle) => self.resolve_group_id(needle),
            None => Ok(self.session.store().read(|s| {
                s.effective_selection()
                    .unwrap_or(DEFAULT_GROUP_ID)
                    .to_string()
            })),
        }
    }

    fn list(&self, args: ListArgs) -> CmdResult {
        let state = self.session.store().snapshot();
        let groups: Vec<_> = if args.all {
            state.groups.iter().collect()
        } else {
            let id = match args.group.as_deref() {
                Some(needle) => Some(self.resolve_group_id(needle)?),
                None => state.effective_selection().map(str::to_string),
            };
            match id {
                Some(id) => state.groups.iter().filter(|g| g.id == id).collect(),
                // Nothing selected: show everything
                None => state.groups.iter().collect(),
            }
        };

        if self.ctx.json {
            let out: Vec<GroupListingJson> =
                groups.iter().map(|g| listing_to_json(g, &state)).collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            for (i, group) in groups.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", format_group_listing(group, &state));
            }
        }
        Ok(())
    }

    fn add(&self, args: AddArgs) -> CmdResult {
        let store = self.session.store();
        let text = args.text();
        if text.trim().is_empty() {
            return Err("todo text cannot be empty".into());
        }

        if let Some(name) = args.new_group.as_deref() {
            let group_id = store.add_todo_with_new_group(&text, name);
            if self.ctx.json {
                println!("{}", serde_json::json!({ "group_id": group_id }));
            } else {
                println!("{}", group_id);
            }
            return Ok(());
        }

        let group_id = self.target_group(args.group.as_deref())?;
        let id = store.add_todo(&text, &group_id)?;
        if self.ctx.json {
            println!("{}", serde_json::json!({ "id": id, "group_id": group_id }));
        } else {
            println!("{}", id);
        }
        Ok(())
    }

    fn toggle(&self, args: TodoIdArg) -> CmdResult {
        let store = self.session.store();
        let id = self.resolve_todo_id(&args.id)?;
        store.toggle_todo(&id);
        // Gone already if something deleted it in between; say so
        let todo = store
            .read(|s| s.todo(&id).cloned())
            .ok_or_else(|| format!("todo not found: {}", args.id))?;
        if self.ctx.json {
            println!("{}", serde_json::to_string_pretty(&todo_to_json(&todo))?);
        } else {
            println!("{}", format_todo_line(&todo));
        }
        Ok(())
    }

    fn rm(&self, args: TodoIdArg) -> CmdResult {
        let id = self.resolve_todo_id(&args.id)?;
        match self.session.store().delete_todo(&id) {
            Some(todo) => {
                journal_removed(
                    self.ctx,
                    format!("todo {} deleted", short_id(&todo.id)),
                    std::slice::from_ref(&todo),
                );
                println!("deleted {}", short_id(&todo.id));
            }
            None => println!("nothing to delete"),
        }
        Ok(())
    }

    fn group_list(&self) -> CmdResult {
        let state = self.session.store().snapshot();
        if self.ctx.json {
            let out: Vec<GroupJson> = state
                .groups
                .iter()
                .map(|g| group_to_json(g, &state))
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            for group in &state.groups {
                println!("{}", format_group_line(group, &state));
            }
        }
        Ok(())
    }

    fn group_add(&self, args: GroupAddArgs) -> CmdResult {
        let name = args.name.join(" ");
        if name.trim().is_empty() {
            return Err("group name cannot be empty".into());
        }
        let id = self
            .session
            .store()
            .add_group(&name, args.color.as_deref());
        println!("{}", id);
        Ok(())
    }

    fn group_rm(&self, args: GroupArg) -> CmdResult {
        let id = self.resolve_group_id(&args.group)?;
        let name = self
            .session
            .store()
            .read(|s| s.group(&id).map(|g| g.name.clone()))
            .unwrap_or_default();
        let removed = self.session.store().delete_group(&id)?;
        journal_removed(
            self.ctx,
            format!("group {} deleted", name),
            &removed,
        );
        println!("deleted group {} ({} todos)", name, removed.len());
        Ok(())
    }

    fn group_select(&self, args: GroupSelectArgs) -> CmdResult {
        let store = self.session.store();
        if args.none {
            store.select_group(None);
            println!("selection cleared");
            return Ok(());
        }
        let needle = args.group.ok_or("no group given")?;
        let id = self.resolve_group_id(&needle)?;
        store.select_group(Some(&id));
        let name = store
            .read(|s| s.group(&id).map(|g| g.name.clone()))
            .unwrap_or_default();
        println!("selected {}", name);
        Ok(())
    }

    /// Run the reset check. Every `reset` goes through the store's check.
    fn reset_outcome(&mut self) -> ResetOutcome {
        let outcome = self.session.store().run_daily_reset();
        match (outcome, self.hydration_reset.take()) {
            (ResetOutcome::Current, Some(opened)) => opened,
            _ => outcome,
        }
    }

    fn reset(&mut self) -> CmdResult {
        let outcome = self.reset_outcome();
        let store = self.session.store();
        let date = store
            .read(|s| s.last_reset_date)
            .map(date_str)
            .unwrap_or_default();

        if self.ctx.json {
            let (status, cleared) = match outcome {
                ResetOutcome::Reset { cleared } => ("reset", cleared),
                ResetOutcome::Current => ("current", 0),
                ResetOutcome::AheadOfClock { .. } => ("clock_behind", 0),
            };
            println!(
                "{}",
                serde_json::json!({ "status": status, "cleared": cleared, "last_reset_date": date })
            );
            return Ok(());
        }

        match outcome {
            ResetOutcome::Reset { cleared } => {
                println!("reset for {}: unchecked {} todos", date, cleared)
            }
            ResetOutcome::Current => println!("already reset today ({})", date),
            ResetOutcome::AheadOfClock { last } => println!(
                "last reset ({}) is later than today; check the system clock",
                date_str(last)
            ),
        }
        Ok(())
    }

    fn status(&self) -> CmdResult {
        let state = self.session.store().snapshot();
        let done = state.todos.iter().filter(|t| t.completed).count();
        let status = StatusJson {
            data_dir: self.ctx.data_dir.display().to_string(),
            document: self.ctx.document_path().display().to_string(),
            last_reset_date: state.last_reset_date.map(date_str),
            selected_group_id: state.effective_selection().map(str::to_string),
            groups: state.groups.len(),
            todos: state.todos.len(),
            done,
        };

        if self.ctx.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(());
        }

        let selected = status
            .selected_group_id
            .as_deref()
            .and_then(|id| state.group(id))
            .map(|g| g.name.as_str())
            .unwrap_or("(none)");
        println!("document:   {}", status.document);
        println!(
            "last reset: {}",
            status.last_reset_date.as_deref().unwrap_or("(never)")
        );
        println!("selected:   {}", selected);
        println!(
            "groups: {}  todos: {} ({} done)",
            status.groups, status.todos, status.done
        );

        let writer = self.session.store().writer_status();
        if let Some(err) = writer.last_error {
            println!("last write failed: {}", err);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

fn cmd_check(ctx: &Context) -> CmdResult {
    let gateway = ctx.gateway();
    let Some(state) = gateway.load()? else {
        println!("no task list yet at {}", gateway.path().display());
        return Ok(());
    };
    let result = check::check_state(&state);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !result.errors.is_empty() {
        println!("Errors:");
        for err in &result.errors {
            match err {
                check::CheckError::MissingDefaultGroup => {
                    println!("  the default group is missing")
                }
                check::CheckError::DuplicateGroupId { group_id } => {
                    println!("  group id {} is used more than once", group_id)
                }
                check::CheckError::DuplicateTodoId { todo_id } => {
                    println!("  todo id {} is used more than once", todo_id)
                }
                check::CheckError::OrphanTodo { todo_id, group_id } => {
                    println!("  todo {} belongs to missing group {}", todo_id, group_id)
                }
            }
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            println!();
        }
        println!("Warnings:");
        for warn in &result.warnings {
            match warn {
                check::CheckWarning::DanglingSelection { group_id } => {
                    println!("  selected group {} no longer exists", group_id)
                }
                check::CheckWarning::MissingResetDate => println!("  no lastResetDate recorded"),
                check::CheckWarning::MissingCreatedAt { todo_id } => {
                    println!("  todo {} has no createdAt", todo_id)
                }
            }
        }
    }
    if result.valid {
        println!("✓ task list is valid");
    } else {
        println!("✗ task list has errors (they are repaired the next time it is opened)");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

fn cmd_recovery(ctx: &Context, args: RecoveryCmd) -> CmdResult {
    match args.action {
        Some(RecoveryAction::Path) => {
            println!("{}", recovery::recovery_log_path(&ctx.data_dir).display());
        }
        Some(RecoveryAction::Prune(prune)) => {
            let removed = recovery::prune_recovery(&ctx.data_dir, prune.all)?;
            println!("pruned {} entries", removed);
        }
        None => {
            let entries =
                recovery::read_recovery_entries(&ctx.data_dir, Some(args.limit.unwrap_or(10)));
            if ctx.json {
                let out: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if entries.is_empty() {
                println!("recovery log is empty");
            } else {
                for entry in &entries {
                    print!("{}", entry.to_markdown());
                }
            }
        }
    }
    Ok(())
}
