//! Example 01: Basic CRUD Operations
//!
//! This example walks through adding, editing, toggling, and deleting tasks
//! with a file-backed TaskStore, then reopens the store to show that every
//! change was persisted.
//!
//! Run with: cargo run --example 01_basic_crud

use eyre::Result;
use todostore::{FileStorage, TaskError, TaskStore};

fn main() -> Result<()> {
    // Create a temporary directory for this example
    let temp_dir = tempfile::tempdir()?;
    let data_dir = temp_dir.path().to_path_buf();

    println!("todostore Basic CRUD Example");
    println!("============================\n");
    println!("Data dir: {}\n", data_dir.display());

    // A `()` view renders nothing; this example prints state itself
    let mut store = TaskStore::open(FileStorage::open(&data_dir)?, ());

    // CREATE
    println!("1. CREATE - Adding tasks...");
    let milk = store.add("Buy milk")?;
    let dog = store.add("  Walk dog  ")?;
    println!("   Added {} ({})", milk.text, milk.id);
    println!("   Added {} ({}) - surrounding whitespace trimmed\n", dog.text, dog.id);

    // Empty input is rejected without touching the list
    match store.add("   ") {
        Err(TaskError::EmptyInput) => println!("   Rejected empty task, still {} tasks\n", store.len()),
        other => println!("   Unexpected result: {:?}\n", other),
    }

    // UPDATE
    println!("2. UPDATE - Editing and completing...");
    let edited = store.edit(&milk.id, "Buy oat milk")?;
    println!("   Edited text: {}", edited.text);
    let toggled = store.toggle(&dog.id)?;
    println!("   {} completed: {}\n", toggled.text, toggled.completed);

    // READ
    println!("3. READ - Current list...");
    for task in store.tasks() {
        println!("   [{}] {}", if task.completed { "x" } else { " " }, task.text);
    }
    println!("   Remaining: {}\n", store.remaining_count());

    // DELETE
    println!("4. DELETE - Removing a task (twice)...");
    println!("   First delete removed: {:?}", store.delete(&milk.id).map(|t| t.text));
    println!("   Second delete removed: {:?}\n", store.delete(&milk.id).map(|t| t.text));

    // Reopen from disk
    println!("5. REOPEN - Loading from {}...", data_dir.join("todos.json").display());
    drop(store);
    let store = TaskStore::open(FileStorage::open(&data_dir)?, ());
    for task in store.tasks() {
        println!("   [{}] {}", if task.completed { "x" } else { " " }, task.text);
    }

    println!("\nExample complete!");
    Ok(())
}
