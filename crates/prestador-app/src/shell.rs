//! Line-oriented shell driving the edit screen.
//!
//! The shell is the composition root: it owns the identity and route
//! sources, wires them to the pipeline and the auth router, and maps
//! navigation paths onto the edit screen's lifetime.
//!
//! ```text
//! login <id> <email>    sign in
//! logout                sign out
//! new                   open the create screen
//! edit <id>             open the edit screen for a record
//! set <field> <value>   name | description | phone | useEmail
//! show                  print the form and its validation state
//! submit | cancel
//! copy <email|phone>    contact for the open record
//! delete                delete the open record
//! where                 current path
//! quit
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use prestador_client::{
    AuthRouter, CommitCoordinator, ContactKind, EditScreen, EntitySyncPipeline, Field,
    FieldValue, FormValidationGate, IdentitySource, Navigator, Notifier, RoutePaths, RouteSource,
    ScreenMode, ServiceCard, SharedRecordStore, SubmitOutcome, SubscriptionHandle,
};
use prestador_types::{Identity, RouteParam};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

const SERVICES_PREFIX: &str = "/services/";
const NEW_SEGMENT: &str = "new";

/// Route param for a service screen path, `None` for any other path.
pub fn service_route(path: &str) -> Option<RouteParam> {
    match path.strip_prefix(SERVICES_PREFIX)? {
        NEW_SEGMENT => Some(RouteParam::create()),
        "" => None,
        id if id.contains('/') => None,
        id => Some(RouteParam::edit(id)),
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Path history. Entering a service path publishes its route param.
pub struct ShellNavigator {
    history: Mutex<Vec<String>>,
    routes: Arc<RouteSource>,
}

impl ShellNavigator {
    pub fn new(routes: Arc<RouteSource>) -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            routes,
        }
    }

    pub fn current(&self) -> Option<String> {
        self.history.lock().last().cloned()
    }

    fn enter(&self, path: &str) {
        if let Some(param) = service_route(path) {
            self.routes.set(param);
        }
    }
}

impl Navigator for ShellNavigator {
    fn go_to(&self, path: &str) {
        debug!("navigate → {path}");
        self.history.lock().push(path.to_string());
        self.enter(path);
    }

    fn back(&self) {
        let top = {
            let mut history = self.history.lock();
            if history.len() > 1 {
                history.pop();
            }
            history.last().cloned()
        };
        debug!("navigate back → {top:?}");
        if let Some(path) = top {
            self.enter(&path);
        }
    }
}

/// Prints dialogs inline.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn show(&self, title: &str, message: &str) {
        println!("!! {title}: {message}");
    }
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("expected true or false, got {0}")]
    BadFlag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { id: String, email: String },
    Logout,
    New,
    Edit(String),
    Set(Field, FieldValue),
    Show,
    Submit,
    Cancel,
    Copy(ContactKind),
    Delete,
    Where,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match verb {
            "" => return Ok(None),
            "login" => {
                let mut args = rest.split_whitespace();
                let id = args.next().ok_or(CommandError::MissingArgument("id"))?;
                let email = args.next().ok_or(CommandError::MissingArgument("email"))?;
                Command::Login {
                    id: id.to_string(),
                    email: email.to_string(),
                }
            }
            "logout" => Command::Logout,
            "new" => Command::New,
            "edit" if rest.is_empty() => return Err(CommandError::MissingArgument("id")),
            "edit" => Command::Edit(rest.to_string()),
            "set" => {
                let (name, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if name.is_empty() {
                    return Err(CommandError::MissingArgument("field"));
                }
                let field: Field = name
                    .parse()
                    .map_err(|_| CommandError::UnknownField(name.to_string()))?;
                let value = value.trim();
                let value = match field {
                    Field::UseEmail => FieldValue::Flag(
                        value
                            .parse()
                            .map_err(|_| CommandError::BadFlag(value.to_string()))?,
                    ),
                    _ => FieldValue::Text(value.to_string()),
                };
                Command::Set(field, value)
            }
            "show" => Command::Show,
            "submit" => Command::Submit,
            "cancel" => Command::Cancel,
            "copy" => match rest {
                "email" => Command::Copy(ContactKind::Email),
                "phone" => Command::Copy(ContactKind::Phone),
                "" => return Err(CommandError::MissingArgument("email|phone")),
                other => return Err(CommandError::Unknown(format!("copy {other}"))),
            },
            "delete" => Command::Delete,
            "where" => Command::Where,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

// ============================================================================
// Shell
// ============================================================================

pub struct Shell {
    identity: Arc<IdentitySource>,
    navigator: Arc<ShellNavigator>,
    coordinator: Arc<CommitCoordinator>,
    screen: EditScreen,
    /// Path the screen was activated for.
    screen_path: Option<String>,
    _router: SubscriptionHandle,
}

impl Shell {
    /// Wire everything up. Must be called inside a tokio runtime.
    pub fn new(store: SharedRecordStore, paths: RoutePaths) -> Self {
        let identity = Arc::new(IdentitySource::default());
        let routes = Arc::new(RouteSource::default());
        let navigator = Arc::new(ShellNavigator::new(routes.clone()));
        let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);

        let router = AuthRouter::new(navigator.clone(), paths).spawn(identity.as_ref());
        let pipeline = EntitySyncPipeline::new(identity.clone(), routes, store.clone());
        let coordinator = Arc::new(CommitCoordinator::new(
            store,
            notifier.clone(),
            navigator.clone(),
            FormValidationGate::new(),
        ));
        let screen = EditScreen::new(pipeline, coordinator.clone(), notifier, navigator.clone());

        Self {
            identity,
            navigator,
            coordinator,
            screen,
            screen_path: None,
            _router: router,
        }
    }

    pub fn current_path(&self) -> Option<String> {
        self.navigator.current()
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("prestador: type `help` for commands");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if self.handle_line(&line).await == Flow::Quit {
                        break;
                    }
                }
                load = self.screen.recv_load() => {
                    match load {
                        Some(load) => {
                            self.screen.apply(load);
                            self.print_screen();
                        }
                        None => {
                            debug!("pipeline closed");
                            self.screen.deactivate();
                        }
                    }
                }
            }
            self.sync_screen();
        }

        info!("shell exiting");
        Ok(())
    }

    /// Parse and execute one line, reporting errors inline.
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        let flow = match Command::parse(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => Flow::Continue,
            Err(e) => {
                println!("error: {e}");
                Flow::Continue
            }
        };
        self.sync_screen();
        flow
    }

    async fn execute(&mut self, command: Command) -> Flow {
        match command {
            Command::Login { id, email } => self.identity.set(Some(Identity::new(id, email))),
            Command::Logout => self.identity.set(None),
            Command::New => self.navigator.go_to(&format!("{SERVICES_PREFIX}{NEW_SEGMENT}")),
            Command::Edit(id) => self.navigator.go_to(&format!("{SERVICES_PREFIX}{id}")),
            Command::Set(field, value) => {
                if !self.screen.is_attached() {
                    println!("no form open");
                } else if let Err(e) = self.screen.set(field, value) {
                    println!("error: {e}");
                }
            }
            Command::Show => self.print_screen(),
            Command::Submit => match self.screen.submit() {
                None => println!("not signed in yet"),
                Some(SubmitOutcome::Rejected) => {}
                Some(SubmitOutcome::Dispatched { path, .. }) => println!("saving {path}"),
            },
            Command::Cancel => self.screen.cancel(),
            Command::Copy(kind) => match self.open_card() {
                Some(card) => println!("{}", card.contact(kind)),
                None => println!("no record open"),
            },
            Command::Delete => match self.open_card() {
                Some(card) => {
                    println!("deleting {}", card.record().path());
                    if let Err(e) = card.delete().await {
                        warn!("delete task failed: {e}");
                    }
                    self.screen.cancel();
                }
                None => println!("no record open"),
            },
            Command::Where => println!("{}", self.current_path().unwrap_or_default()),
            Command::Help => println!("{}", HELP),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// The record open in edit mode, as a card.
    fn open_card(&self) -> Option<ServiceCard> {
        if self.screen.mode() != ScreenMode::Edit {
            return None;
        }
        let identity = self.identity.current()?;
        let target = self.screen.target()?;
        let record_id = target.record_id.clone()?;
        let record = self.screen.form().to_record(record_id, target.owner_id.clone());
        Some(ServiceCard::new(identity, record, self.coordinator.clone()))
    }

    /// Keep the screen's lifetime in step with the current path.
    fn sync_screen(&mut self) {
        let current = self.navigator.current();
        let on_service = current.as_deref().and_then(service_route).is_some();

        if !on_service {
            if self.screen.mode() != ScreenMode::Inactive {
                self.screen.deactivate();
            }
            self.screen_path = None;
            return;
        }

        let stale = self.screen.mode() == ScreenMode::Failed && self.screen_path != current;
        if self.screen.mode() == ScreenMode::Inactive || stale {
            self.screen.activate();
        }
        self.screen_path = current;
    }

    fn print_screen(&self) {
        let header = self.screen.header();
        match self.screen.mode() {
            ScreenMode::Inactive => {
                println!("(no form open)");
                return;
            }
            ScreenMode::Loading => {
                match header {
                    Some(header) => println!("{}: loading…", header.title),
                    None => println!("loading…"),
                }
                return;
            }
            ScreenMode::Failed => {
                println!("(load failed)");
                return;
            }
            ScreenMode::Create | ScreenMode::Edit => {}
        }

        if let Some(header) = header {
            println!("{}\n{}", header.title, header.subtitle);
        }
        let form = self.screen.form();
        for field in Field::ALL {
            let value = match form.value(field) {
                FieldValue::Text(text) => text,
                FieldValue::Flag(flag) => flag.to_string(),
            };
            let errors = self.coordinator.gate().errors(form, field);
            if errors.is_empty() {
                println!("  {field:<12} {value}");
            } else {
                let errors: Vec<String> = errors.iter().map(|r| r.to_string()).collect();
                println!("  {field:<12} {value}  [{}]", errors.join(", "));
            }
        }
    }
}

const HELP: &str = "\
login <id> <email>    sign in
logout                sign out
new                   open the create screen
edit <id>             open the edit screen for a record
set <field> <value>   name | description | phone | useEmail
show                  print the form
submit | cancel
copy <email|phone>    contact for the open record
delete                delete the open record
where                 current path
quit";

#[cfg(test)]
mod tests {
    use super::*;
    use prestador_client::{MemoryStore, RecordStore, StoreError};
    use prestador_types::{Document, DocumentPath};
    use serde_json::json;

    async fn settle(shell: &mut Shell) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        shell.screen.drain_loads();
        shell.sync_screen();
    }

    #[test]
    fn test_service_route() {
        assert_eq!(service_route("/services/new"), Some(RouteParam::create()));
        assert_eq!(service_route("/services/s1"), Some(RouteParam::edit("s1")));
        assert_eq!(service_route("/services/"), None);
        assert_eq!(service_route("/services/a/b"), None);
        assert_eq!(service_route("/home"), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("login u1 u1@example.com"),
            Ok(Some(Command::Login {
                id: "u1".into(),
                email: "u1@example.com".into()
            }))
        );
        assert_eq!(
            Command::parse("set description Reparo elétrico"),
            Ok(Some(Command::Set(
                Field::Description,
                FieldValue::Text("Reparo elétrico".into())
            )))
        );
        assert_eq!(
            Command::parse("set useEmail true"),
            Ok(Some(Command::Set(Field::UseEmail, FieldValue::Flag(true))))
        );
        assert_eq!(Command::parse("   "), Ok(None));
        assert_eq!(
            Command::parse("set colour red"),
            Err(CommandError::UnknownField("colour".into()))
        );
        assert_eq!(
            Command::parse("set useEmail sim"),
            Err(CommandError::BadFlag("sim".into()))
        );
        assert_eq!(Command::parse("edit"), Err(CommandError::MissingArgument("id")));
    }

    #[test]
    fn test_navigator_back_republishes_route() {
        let routes = Arc::new(RouteSource::default());
        let nav = ShellNavigator::new(routes.clone());
        nav.go_to("/home");
        nav.go_to("/services/s1");
        nav.go_to("/services/s2");
        assert_eq!(routes.current(), RouteParam::edit("s2"));

        nav.back();
        assert_eq!(nav.current().as_deref(), Some("/services/s1"));
        assert_eq!(routes.current(), RouteParam::edit("s1"));

        nav.back();
        nav.back();
        assert_eq!(nav.current().as_deref(), Some("/home"));
    }

    #[tokio::test]
    async fn test_create_then_edit_session() {
        let store = Arc::new(MemoryStore::new());
        let mut shell = Shell::new(store.clone(), RoutePaths::default());

        shell.handle_line("login u1 u1@example.com").await;
        settle(&mut shell).await;
        assert_eq!(shell.current_path().as_deref(), Some("/home"));

        shell.handle_line("new").await;
        settle(&mut shell).await;
        assert_eq!(shell.screen.mode(), ScreenMode::Create);

        for line in [
            "set name Eletricista",
            "set description Reparo elétrico",
            "set phone 11987654321",
            "set useEmail true",
        ] {
            shell.handle_line(line).await;
        }
        assert_eq!(shell.screen.form().phone, "(11) 98765-4321");

        shell.handle_line("submit").await;
        settle(&mut shell).await;
        assert_eq!(shell.current_path().as_deref(), Some("/home"));
        assert_eq!(shell.screen.mode(), ScreenMode::Inactive);
        assert_eq!(store.len(), 1);

        store.insert_raw(
            &DocumentPath::new("u1".into(), "s9".into()),
            json!({ "id": "s9", "name": "Pedreiro", "providerID": "u1" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        shell.handle_line("edit s9").await;
        settle(&mut shell).await;
        assert_eq!(shell.screen.mode(), ScreenMode::Edit);
        assert_eq!(shell.screen.form().name, "Pedreiro");

        shell.handle_line("delete").await;
        settle(&mut shell).await;
        assert_eq!(store.len(), 1);
        assert_eq!(shell.current_path().as_deref(), Some("/home"));
    }

    /// Memory store whose delete task panics.
    struct PanickyDeletes(MemoryStore);

    #[async_trait::async_trait]
    impl RecordStore for PanickyDeletes {
        async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
            self.0.get(path).await
        }

        async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError> {
            self.0.merge(path, fields).await
        }

        async fn delete(&self, _path: &DocumentPath) -> Result<(), StoreError> {
            panic!("delete blew up");
        }
    }

    #[tokio::test]
    async fn test_failed_delete_task_keeps_shell_running() {
        let store = Arc::new(PanickyDeletes(MemoryStore::new()));
        store.0.insert_raw(
            &DocumentPath::new("u1".into(), "s9".into()),
            json!({ "id": "s9", "name": "Pedreiro", "providerID": "u1" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        let mut shell = Shell::new(store.clone(), RoutePaths::default());

        shell.handle_line("login u1 u1@example.com").await;
        settle(&mut shell).await;
        shell.handle_line("edit s9").await;
        settle(&mut shell).await;
        assert_eq!(shell.screen.mode(), ScreenMode::Edit);

        assert_eq!(shell.handle_line("delete").await, Flow::Continue);
        settle(&mut shell).await;
        assert_eq!(shell.current_path().as_deref(), Some("/home"));
        assert_eq!(store.0.len(), 1);
        assert_eq!(shell.handle_line("where").await, Flow::Continue);
    }

    #[tokio::test]
    async fn test_logout_closes_form() {
        let store = Arc::new(MemoryStore::new());
        let mut shell = Shell::new(store, RoutePaths::default());

        shell.handle_line("login u1 u1@example.com").await;
        settle(&mut shell).await;
        shell.handle_line("new").await;
        settle(&mut shell).await;
        assert!(shell.screen.is_attached());

        shell.handle_line("logout").await;
        settle(&mut shell).await;
        assert_eq!(shell.current_path().as_deref(), Some("/sign-in"));
        assert!(!shell.screen.is_attached());
    }

    #[tokio::test]
    async fn test_quit() {
        let mut shell = Shell::new(Arc::new(MemoryStore::new()), RoutePaths::default());
        assert_eq!(shell.handle_line("quit").await, Flow::Quit);
        assert_eq!(shell.handle_line("bogus").await, Flow::Continue);
    }
}
