use std::io::{self, BufRead, Write};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use good_todo_client::auth::AuthApi;
use good_todo_client::todos::{rows, CreateTodo, EditScope, Pagination, TodoRow, TodoService};
use good_todo_client::{AppError, AppState, CancelHandle, Settings};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "todo", about = "Manage your Good Todo list from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in with email and password (password is read from stdin)
    Login { email: String },
    /// Create an account and log in
    Register { email: String, name: String },
    /// Forget the stored session
    Logout,
    /// Show who the stored token belongs to
    Whoami,
    /// Change your display name
    Profile {
        #[arg(long)]
        name: String,
    },
    /// List your todos, or the team's public todos
    List {
        #[arg(long)]
        public: bool,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Create a todo
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        public: bool,
        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Mark a todo as done
    Done { id: Uuid },
    /// Mark a todo as not done
    Undone { id: Uuid },
    /// Share a todo with the team
    Publish { id: Uuid },
    /// Stop sharing a todo
    Unpublish { id: Uuid },
    /// Delete a todo
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    let config = match Settings::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
    debug!(environment = %config.environment, base_url = %config.api.base_url, "Configuration loaded");

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to start: {}", e);
            std::process::exit(2);
        }
    };

    // Before the signal handler exists, so Ctrl-C at the prompt still exits.
    let password = match &cli.command {
        Command::Login { .. } | Command::Register { .. } => match read_password() {
            Ok(password) => Some(password),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        _ => None,
    };

    let handle = CancelHandle::new();
    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling request");
            ctrl_c.cancel();
        }
    });

    match run(cli.command, password, &state, &handle).await {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => {
            eprintln!("Cancelled.");
            std::process::exit(130);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(
    command: Command,
    password: Option<String>,
    state: &AppState,
    handle: &CancelHandle,
) -> good_todo_client::Result<()> {
    let (auth, todos) = state.scoped(handle);
    let password = password.unwrap_or_default();

    match command {
        Command::Login { email } => {
            let response = auth.login(&email, &password).await?;
            print_login(&auth, response.user.map(|u| u.name))?;
        }
        Command::Register { email, name } => {
            auth.register(&email, &password, &name).await?;
            print_login(&auth, Some(name))?;
        }
        Command::Logout => {
            auth.logout()?;
            println!("Logged out.");
        }
        Command::Whoami => match state.session.current_user()? {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
            None => println!("Not logged in."),
        },
        Command::Profile { name } => {
            require_login(state)?;
            let profile = auth.update_me(&name).await?;
            println!("Display name is now '{}'.", profile.name);
        }
        Command::List { public, limit, offset } => {
            require_login(state)?;
            let page = Pagination { limit, offset };
            let listed = if public {
                let shared = todos.list_public(page).await?;
                let mine = todos.all_mine().await?;
                rows(shared.todos, &EditScope::owned_from(&mine))
            } else {
                rows(todos.list_mine(page).await?.todos, &EditScope::All)
            };
            print_rows(&listed);
        }
        Command::Add { title, description, public, due } => {
            require_login(state)?;
            let todo = todos
                .create(CreateTodo {
                    title,
                    description,
                    is_public: public,
                    due_date: due.map(end_of_day),
                })
                .await?;
            println!("Created {}", todo.id);
        }
        Command::Done { id } => set_completed(&todos, state, id, true).await?,
        Command::Undone { id } => set_completed(&todos, state, id, false).await?,
        Command::Publish { id } => set_public(&todos, state, id, true).await?,
        Command::Unpublish { id } => set_public(&todos, state, id, false).await?,
        Command::Delete { id } => {
            let row = own_row(&todos, state, id).await?;
            todos.remove(&row).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

async fn set_completed(todos: &TodoService, state: &AppState, id: Uuid, done: bool) -> good_todo_client::Result<()> {
    let row = own_row(todos, state, id).await?;
    if row.todo.completed != done {
        todos.toggle_complete(&row).await?;
    }
    println!("{} is {}", id, if done { "done" } else { "not done" });
    Ok(())
}

async fn set_public(todos: &TodoService, state: &AppState, id: Uuid, public: bool) -> good_todo_client::Result<()> {
    let row = own_row(todos, state, id).await?;
    if row.todo.is_public != public {
        todos.toggle_public(&row).await?;
    }
    println!("{} is {}", id, if public { "public" } else { "private" });
    Ok(())
}

// Resolves a todo and whether the logged-in user may edit it.
async fn own_row(todos: &TodoService, state: &AppState, id: Uuid) -> good_todo_client::Result<TodoRow> {
    require_login(state)?;
    let (todo, mine) = futures::try_join!(todos.get(id), todos.all_mine())?;
    let scope = EditScope::owned_from(&mine);
    let mut listed = rows(vec![todo], &scope);
    Ok(listed.remove(0))
}

fn require_login(state: &AppState) -> good_todo_client::Result<()> {
    if state.session.is_authenticated()? {
        Ok(())
    } else {
        Err(good_todo_client::error::AuthError::NotAuthenticated.into())
    }
}

fn print_login(auth: &AuthApi, fallback: Option<String>) -> good_todo_client::Result<()> {
    match auth.session().current_user()? {
        Some(user) => println!("Logged in as {} <{}>.", user.name, user.email),
        None => println!("Logged in as {}.", fallback.unwrap_or_else(|| "unknown user".into())),
    }
    Ok(())
}

fn print_rows(listed: &[TodoRow]) {
    if listed.is_empty() {
        println!("No todos.");
        return;
    }
    for row in listed {
        let todo = &row.todo;
        let check = if todo.completed { "[x]" } else { "[ ]" };
        let visibility = if todo.is_public { "public" } else { "private" };
        let lock = if row.editable { "" } else { " (read-only)" };
        print!("{} {} {} [{}]{}", check, todo.id, todo.title, visibility, lock);
        if let Some(due) = todo.due_date {
            print!(" due {}", due.format("%b %-d, %Y"));
        }
        println!();
        if let Some(description) = todo.description.as_deref().filter(|d| !d.is_empty()) {
            println!("      {}", description);
        }
    }
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59)
        .map_or_else(Utc::now, |dt| dt.and_utc())
}

fn read_password() -> good_todo_client::Result<String> {
    eprint!("Password: ");
    io::stderr().flush().map_err(unreadable)?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).map_err(unreadable)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn unreadable(e: io::Error) -> AppError {
    AppError::IoError(io::Error::new(e.kind(), format!("could not read password: {}", e)))
}
