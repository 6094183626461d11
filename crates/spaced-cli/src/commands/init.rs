//! The `spaced init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("spaced.toml").exists() {
        println!("spaced.toml already exists, skipping.");
    } else {
        std::fs::write("spaced.toml", SAMPLE_CONFIG)?;
        println!("Created spaced.toml");
    }

    std::fs::create_dir_all("decks")?;
    let example_path = Path::new("decks/example.toml");
    if example_path.exists() {
        println!("decks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_DECK)?;
        println!("Created decks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: spaced validate --deck decks/example.toml");
    println!("  2. Run: spaced query --deck decks/example.toml \"is:due order:fsrs\"");
    println!("  3. Run: spaced review --deck decks/example.toml --item two-sum --grade good");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# spaced configuration

default_deck = "decks/example.toml"

[scheduler]
request_retention = 0.9
maximum_interval = 36500
enable_fuzz = false
enable_short_term = true
learning_steps = ["1m", "10m"]
relearning_steps = ["10m"]
"#;

const EXAMPLE_DECK: &str = r#"name = "Example"
description = "A few interview problems to get started"

[[items]]
id = "two-sum"
title = "Two Sum"
tags = ["company:google", "difficulty:easy", "topic:arrays", "hashing"]
category = "leetcode"
kind = "problem"
score = 3.0

[items.review]
due = 0
state = 0

[[items]]
id = "course-schedule"
title = "Course Schedule"
tags = ["company:meta", "difficulty:medium", "topic:graphs"]
category = "leetcode"
kind = "problem"
score = 4.5

[items.review]
due = 0
state = 0

[[items]]
id = "amortized-analysis"
title = "Amortized analysis"
body = "Aggregate, accounting and potential methods."
tags = ["topic:algorithms"]
kind = "note"
"#;
