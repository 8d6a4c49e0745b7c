use std::io::{self, BufRead, Write};

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use todo_list_core::{
    Priority, PriorityFilter, SortType, Task, TaskDraft, TaskStore, ViewPreferences, derive_view,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Line grammar for the interactive session.
#[derive(Parser, Debug)]
#[command(name = "todo", about = "In-memory to-do list")]
struct Repl {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a task, prompting for each field
    Add,
    /// Show the list under the current view settings
    List,
    /// Flip a task between done and open
    Toggle {
        /// Id of the task to flip
        id: u32,
    },
    /// Delete a task for good
    Delete {
        /// Id of the task to delete
        id: u32,
    },
    /// Change the sort order (date, priority, added)
    Sort { order: SortType },
    /// Show only one priority (all, high, medium, low, none)
    Filter { filter: PriorityFilter },
    /// Choose which completion group is listed first
    Group {
        #[arg(value_enum)]
        order: GroupOrder,
    },
    /// Leave the session; the list is not saved
    Quit,
}

/// Which completion group the view shows first.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum GroupOrder {
    /// Completed tasks before open ones
    DoneFirst,
    /// Open tasks before completed ones
    OpenFirst,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut store = TaskStore::new();
    let mut prefs = ViewPreferences::default();

    println!("todo-list: tasks live in memory and vanish on quit. Type `help` for commands.");
    loop {
        let Some(line) = read_command_line(&mut input)? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let repl = match Repl::try_parse_from(std::iter::once("todo").chain(line.split_whitespace()))
        {
            Ok(repl) => repl,
            Err(err) => {
                // clap renders its own usage and help output
                let _ = err.print();
                continue;
            }
        };
        match repl.command {
            Command::Add => add_task(&mut input, &mut store, &prefs)?,
            Command::List => render(&derive_view(store.tasks(), &prefs), &prefs),
            Command::Toggle { id } => toggle_task(&mut input, &mut store, &prefs, id)?,
            Command::Delete { id } => delete_task(&mut input, &mut store, &prefs, id)?,
            Command::Sort { order } => {
                prefs.sort = order;
                render(&derive_view(store.tasks(), &prefs), &prefs);
            }
            Command::Filter { filter } => {
                prefs.filter = filter;
                render(&derive_view(store.tasks(), &prefs), &prefs);
            }
            Command::Group { order } => {
                prefs.completed_first = matches!(order, GroupOrder::DoneFirst);
                render(&derive_view(store.tasks(), &prefs), &prefs);
            }
            Command::Quit => break,
        }
    }
    Ok(())
}

/// Prints the prompt and reads one command line; `None` means end of input.
fn read_command_line(input: &mut impl BufRead) -> anyhow::Result<Option<String>> {
    print!("> ");
    io::stdout().flush().context("failed to flush prompt")?;
    let mut line = String::new();
    let bytes = input.read_line(&mut line).context("failed to read input")?;
    if bytes == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Walks through the task form field by field and creates the task.
fn add_task(
    input: &mut impl BufRead,
    store: &mut TaskStore,
    prefs: &ViewPreferences,
) -> anyhow::Result<()> {
    let name = prompt_line(input, "name: ")?;
    let description = prompt_line(input, "description: ")?;
    let due_date = prompt_optional(input, "due date (YYYY-MM-DD, blank = today): ", parse_due_date)?;
    let due_time = prompt_optional(input, "due time (HH:MM, blank = 23:59): ", parse_due_time)?;
    let priority = prompt_optional(
        input,
        "priority (high/medium/low/none, blank = none): ",
        |answer| answer.parse::<Priority>().ok(),
    )?;

    let task = store.add(TaskDraft {
        name,
        description,
        due_date,
        due_time,
        priority,
    });
    debug!(id = task.id, "task added");
    println!("added task {}", task.id);
    render(&derive_view(store.tasks(), prefs), prefs);
    Ok(())
}

fn toggle_task(
    input: &mut impl BufRead,
    store: &mut TaskStore,
    prefs: &ViewPreferences,
    id: u32,
) -> anyhow::Result<()> {
    let Some(task) = store.find_by_id(id) else {
        println!("no task with id {id}");
        return Ok(());
    };
    // The wording depends on the current state; the flip itself does not.
    let prompt = if task.completed {
        format!("return task {id} \"{}\" to open?", task.name)
    } else {
        format!("mark task {id} \"{}\" as done?", task.name)
    };
    if !confirm(input, &prompt)? {
        println!("left task {id} as it was");
        return Ok(());
    }
    if let Some(completed) = store.toggle_completed(id) {
        debug!(id, completed, "task toggled");
        println!("task {id} is now {}", if completed { "done" } else { "open" });
    }
    render(&derive_view(store.tasks(), prefs), prefs);
    Ok(())
}

fn delete_task(
    input: &mut impl BufRead,
    store: &mut TaskStore,
    prefs: &ViewPreferences,
    id: u32,
) -> anyhow::Result<()> {
    let Some(task) = store.find_by_id(id) else {
        println!("no task with id {id}");
        return Ok(());
    };
    let prompt = format!("delete task {id} \"{}\"? this cannot be undone.", task.name);
    if !confirm(input, &prompt)? {
        println!("kept task {id}");
        return Ok(());
    }
    store.delete(id);
    debug!(id, "task deleted");
    println!("deleted task {id}");
    render(&derive_view(store.tasks(), prefs), prefs);
    Ok(())
}

/// Asks for a yes/no decision; anything but y/yes declines.
fn confirm(input: &mut impl BufRead, prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush().context("failed to flush prompt")?;
    let mut answer = String::new();
    input.read_line(&mut answer).context("failed to read input")?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

fn prompt_line(input: &mut impl BufRead, prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    io::stdout().flush().context("failed to flush prompt")?;
    let mut line = String::new();
    input.read_line(&mut line).context("failed to read input")?;
    Ok(line.trim().to_string())
}

/// Prompts until the answer parses; a blank answer selects the default.
fn prompt_optional<T>(
    input: &mut impl BufRead,
    prompt: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> anyhow::Result<Option<T>> {
    loop {
        let answer = prompt_line(input, prompt)?;
        if answer.is_empty() {
            return Ok(None);
        }
        match parse(&answer) {
            Some(value) => return Ok(Some(value)),
            None => println!("could not read `{answer}`, try again (blank for the default)"),
        }
    }
}

fn parse_due_date(answer: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(answer, "%Y-%m-%d").ok()
}

fn parse_due_time(answer: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(answer, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(answer, "%H:%M:%S"))
        .ok()
}

fn render(view: &[&Task], prefs: &ViewPreferences) {
    println!(
        "sort: {}  filter: {}  showing {} first",
        prefs.sort,
        prefs.filter,
        if prefs.completed_first { "done" } else { "open" },
    );
    if view.is_empty() {
        println!("(no tasks)");
        return;
    }
    for task in view {
        let marker = if task.completed { "[x]" } else { "[ ]" };
        println!(
            "{:>3} {} {:<6} due {} {}  {}",
            task.id,
            marker,
            task.priority.to_string(),
            task.due_date,
            task.due_time.format("%H:%M"),
            task.name,
        );
        if !task.description.is_empty() {
            println!("            {}", task.description);
        }
    }
}
