//! Example 02: Filtering and the View Collaborator
//!
//! This example plugs a small custom View into an in-memory TaskStore and
//! shows how the active filter changes what gets rendered, while the
//! remaining count always reflects every open task.
//!
//! Run with: cargo run --example 02_filtering

use eyre::Result;
use todostore::{Filter, MemoryStorage, Task, TaskStore, View, remaining_summary};

/// Prints every snapshot the store hands over
struct PrintView;

impl View for PrintView {
    fn render(&mut self, visible: &[&Task], remaining: usize) {
        let texts: Vec<&str> = visible.iter().map(|t| t.text.as_str()).collect();
        println!("   render: {:?} ({})", texts, remaining_summary(remaining));
    }

    fn task_completed(&mut self, task: &Task) {
        println!("   completed: {}!", task.text);
    }
}

fn main() -> Result<()> {
    println!("todostore Filtering Example");
    println!("===========================\n");

    println!("1. Opening an empty in-memory store...");
    let mut store = TaskStore::open(MemoryStorage::new(), PrintView);

    println!("\n2. Adding tasks...");
    let milk = store.add("Buy milk")?;
    store.add("Walk dog")?;
    let taxes = store.add("File taxes")?;

    println!("\n3. Completing two of them...");
    store.toggle(&milk.id)?;
    store.toggle(&taxes.id)?;

    println!("\n4. Switching filters...");
    for filter in [Filter::Active, Filter::Completed, Filter::All] {
        println!("   filter = {}", filter);
        store.set_filter(filter);
    }

    println!("\n5. Clearing completed tasks...");
    let removed = store.clear_completed();
    println!("   removed {} task(s)", removed);

    println!("\nExample complete!");
    Ok(())
}
